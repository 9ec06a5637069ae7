//! Row-to-column conversion with insert-time type coercion.
//!
//! Insert plans carry row-oriented literal values; storage wants one columnar
//! batch typed per the catalog schema. Coercion is all-or-nothing: the first
//! value that cannot be converted fails the whole batch before any I/O.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

use crate::data::{LogicalType, Value};
use crate::table::{ColumnDef, TableSchema};
use crate::{LakeError, Result};

/// Build the physical Arrow schema for a catalog table schema.
pub fn arrow_schema(schema: &TableSchema) -> SchemaRef {
    let fields: Vec<Field> = schema
        .columns()
        .iter()
        .map(|c| Field::new(c.name.as_str(), c.logical_type.arrow_type(), false))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Convert row-oriented values into one columnar [`RecordBatch`].
///
/// `order`, when present, maps each schema column index to the position of
/// its value within a row (used when the insert listed columns in a
/// non-schema order). Row arity must already have been validated.
pub fn batch_from_rows(
    schema: &TableSchema,
    rows: &[Vec<Value>],
    order: Option<&[usize]>,
) -> Result<RecordBatch> {
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.len());

    for (col_idx, col) in schema.columns().iter().enumerate() {
        let source_idx = order.map_or(col_idx, |o| o[col_idx]);
        let values = rows.iter().map(|row| &row[source_idx]);
        arrays.push(build_column(col, values)?);
    }

    let batch = RecordBatch::try_new(arrow_schema(schema), arrays)?;
    Ok(batch)
}

fn build_column<'a>(
    col: &ColumnDef,
    values: impl Iterator<Item = &'a Value>,
) -> Result<ArrayRef> {
    Ok(match col.logical_type {
        LogicalType::Integer => {
            let data: Vec<i64> = values
                .map(|v| coerce_integer(v).ok_or_else(|| coercion_error(col, v)))
                .collect::<Result<_>>()?;
            Arc::new(Int64Array::from(data))
        }
        LogicalType::Float => {
            let data: Vec<f64> = values
                .map(|v| coerce_float(v).ok_or_else(|| coercion_error(col, v)))
                .collect::<Result<_>>()?;
            Arc::new(Float64Array::from(data))
        }
        LogicalType::Text => {
            let data: Vec<String> = values
                .map(|v| coerce_text(v).ok_or_else(|| coercion_error(col, v)))
                .collect::<Result<_>>()?;
            Arc::new(StringArray::from_iter_values(data))
        }
        LogicalType::Date => {
            let data: Vec<i32> = values
                .map(|v| coerce_date(v).ok_or_else(|| coercion_error(col, v)))
                .collect::<Result<_>>()?;
            Arc::new(Date32Array::from(data))
        }
        LogicalType::Boolean => {
            let data: Vec<bool> = values
                .map(|v| coerce_boolean(v).ok_or_else(|| coercion_error(col, v)))
                .collect::<Result<_>>()?;
            Arc::new(BooleanArray::from(data))
        }
    })
}

fn coercion_error(col: &ColumnDef, value: &Value) -> LakeError {
    LakeError::TypeCoercion {
        column: col.name.clone(),
        value: value.to_string(),
        expected: col.logical_type,
    }
}

fn coerce_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Integer(i) => Some(*i),
        // Only integral floats that convert without saturation; the upper
        // bound is exclusive because `i64::MAX as f64` rounds up to 2^63.
        Value::Float(f)
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
        {
            Some(*f as i64)
        }
        Value::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_float(v: &Value) -> Option<f64> {
    match v {
        Value::Float(f) => Some(*f),
        Value::Integer(i) => Some(*i as f64),
        Value::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn coerce_boolean(v: &Value) -> Option<bool> {
    match v {
        Value::Boolean(b) => Some(*b),
        Value::Text(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::Text(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Days since the Unix epoch, the Arrow `Date32` representation.
fn coerce_date(v: &Value) -> Option<i32> {
    let text = match v {
        Value::Date(s) | Value::Text(s) => s,
        _ => return None,
    };
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()?;
    Some((date - NaiveDate::default()).num_days() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableSchema;

    fn schema(cols: &[(&str, LogicalType)]) -> TableSchema {
        TableSchema::new(
            cols.iter()
                .map(|(n, t)| ColumnDef {
                    name: n.to_string(),
                    logical_type: *t,
                })
                .collect(),
        )
    }

    #[test]
    fn test_batch_from_rows() {
        let schema = schema(&[
            ("id", LogicalType::Integer),
            ("name", LogicalType::Text),
            ("score", LogicalType::Float),
            ("active", LogicalType::Boolean),
            ("joined", LogicalType::Date),
        ]);

        let rows = vec![
            vec![
                Value::Integer(1),
                Value::from("alice"),
                Value::Float(9.5),
                Value::Boolean(true),
                Value::Date("2022-01-15".into()),
            ],
            vec![
                Value::from("2"),
                Value::from("bob"),
                Value::Integer(7),
                Value::from("false"),
                Value::from("1970-01-02"),
            ],
        ];

        let batch = batch_from_rows(&schema, &rows, None).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 5);

        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(ids.values(), &[1, 2]);

        let joined = batch
            .column(4)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(joined.value(1), 1); // one day after epoch
    }

    #[test]
    fn test_coercion_failure_names_column_and_value() {
        let schema = schema(&[("a", LogicalType::Integer)]);
        let rows = vec![vec![Value::from("x")]];

        let err = batch_from_rows(&schema, &rows, None).unwrap_err();
        match err {
            LakeError::TypeCoercion { column, value, expected } => {
                assert_eq!(column, "a");
                assert_eq!(value, "x");
                assert_eq!(expected, LogicalType::Integer);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_float_rejected_for_integer() {
        let schema = schema(&[("a", LogicalType::Integer)]);

        // Integral but far outside i64: must fail, never saturate.
        for huge in [1e300, -1e300, 9.3e18, f64::INFINITY] {
            let rows = vec![vec![Value::Float(huge)]];
            assert!(
                matches!(
                    batch_from_rows(&schema, &rows, None),
                    Err(LakeError::TypeCoercion { .. })
                ),
                "{} must not coerce to INTEGER",
                huge
            );
        }

        // In-range integral floats still convert exactly.
        let rows = vec![vec![Value::Float(-3.0)], vec![Value::Float(2.0_f64.powi(53))]];
        let batch = batch_from_rows(&schema, &rows, None).unwrap();
        let a = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(a.value(0), -3);
        assert_eq!(a.value(1), 1 << 53);
    }

    #[test]
    fn test_null_never_coerces() {
        let schema = schema(&[("a", LogicalType::Text)]);
        let rows = vec![vec![Value::Null]];
        assert!(matches!(
            batch_from_rows(&schema, &rows, None),
            Err(LakeError::TypeCoercion { .. })
        ));
    }

    #[test]
    fn test_column_reordering() {
        let schema = schema(&[("a", LogicalType::Integer), ("b", LogicalType::Text)]);
        // Rows arrived as (b, a); order maps schema index -> row position.
        let rows = vec![vec![Value::from("one"), Value::Integer(1)]];
        let batch = batch_from_rows(&schema, &rows, Some(&[1, 0])).unwrap();

        let a = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(a.value(0), 1);
    }

    #[test]
    fn test_empty_batch() {
        let schema = schema(&[("a", LogicalType::Integer)]);
        let batch = batch_from_rows(&schema, &[], None).unwrap();
        assert_eq!(batch.num_rows(), 0);
    }
}
