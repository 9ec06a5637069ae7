//! Typed operation descriptors handed over by the parser adapter.
//!
//! Plans are already validated for syntax, never for semantics: existence,
//! column validity, and type compatibility are the engine's job. The core
//! consumes plans and never produces them.

use crate::data::{LogicalType, Value};
use crate::table::ColumnDef;

/// One parsed statement, dispatched on by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    CreateTable(CreateTablePlan),
    Insert(InsertPlan),
    Select(SelectPlan),
}

/// `CREATE TABLE <name> (<col> <type>, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTablePlan {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

/// `INSERT INTO <name> [(<cols>)] VALUES (...), (...)`
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    pub table_name: String,
    /// Explicit column list, in statement order; `None` means schema order.
    pub column_names: Option<Vec<String>>,
    /// Row-oriented literal values, one inner vec per row.
    pub rows: Vec<Vec<Value>>,
    /// Types the adapter inferred from the literals, one per value position.
    /// Advisory only: the catalog schema is the coercion authority.
    pub inferred_types: Vec<LogicalType>,
}

/// `SELECT [*|<cols>] FROM <name>`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectPlan {
    pub table_names: Vec<String>,
    /// One projection list per table; `None` or an empty list means all
    /// columns.
    pub projections: Option<Vec<Vec<String>>>,
}

impl SelectPlan {
    /// A full-projection select over a single table.
    pub fn star(table: impl Into<String>) -> Self {
        Self {
            table_names: vec![table.into()],
            projections: None,
        }
    }
}
