//! Plan model and execution engine.

mod executor;
mod plan;

pub use executor::{ExecutionEngine, ExecutionResult, MAX_RESULT_ROWS};
pub use plan::{CreateTablePlan, InsertPlan, Plan, SelectPlan};
