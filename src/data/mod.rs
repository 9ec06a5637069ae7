//! Logical types, adapter literals, and row-to-column conversion.

mod batch;
mod types;

pub use batch::{arrow_schema, batch_from_rows};
pub use types::{LogicalType, Value};
