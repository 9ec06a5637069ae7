//! Logical column types and the scalar literals the parser adapter hands over.

use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared SQL-level column type.
///
/// Each logical type maps to exactly one physical Arrow type; the mapping is
/// fixed and applied during insert-time coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalType {
    #[serde(alias = "INT", alias = "BIGINT")]
    Integer,
    #[serde(alias = "DOUBLE")]
    Float,
    #[serde(alias = "VARCHAR")]
    Text,
    Date,
    Boolean,
}

impl LogicalType {
    /// Parse a SQL type name (case-insensitive, including common synonyms).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" | "BIGINT" => Some(Self::Integer),
            "FLOAT" | "DOUBLE" => Some(Self::Float),
            "VARCHAR" | "TEXT" => Some(Self::Text),
            "DATE" => Some(Self::Date),
            "BOOLEAN" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// The physical Arrow type this logical type is stored as.
    pub fn arrow_type(&self) -> DataType {
        match self {
            Self::Integer => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::Text => DataType::Utf8,
            Self::Date => DataType::Date32,
            Self::Boolean => DataType::Boolean,
        }
    }

    /// Canonical SQL name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Text => "TEXT",
            Self::Date => "DATE",
            Self::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar literal as produced by the parser adapter.
///
/// Values arrive untyped with respect to the catalog: the engine coerces them
/// to the declared column type at insert time, never the other way around.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    /// A date literal kept in its source form (`YYYY-MM-DD`).
    Date(String),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => f.write_str(v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Date(v) => f.write_str(v),
            Value::Null => f.write_str("NULL"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}
