//! Execution engine: a stateless dispatcher over plan kind.
//!
//! The engine holds only the catalog and a storage backend, both supplied at
//! construction, so a backend can be substituted without touching engine
//! logic. Every call is self-contained; semantic validation and type
//! coercion always complete before any storage I/O.

use arrow::record_batch::RecordBatch;
use chrono::Utc;

use crate::config::Settings;
use crate::data::batch_from_rows;
use crate::query::plan::{CreateTablePlan, InsertPlan, Plan, SelectPlan};
use crate::storage::{storage_for, DataStorage};
use crate::table::{TableCatalog, TableSchema};
use crate::{LakeError, Result};

/// Fixed cap on the number of rows a select returns.
pub const MAX_RESULT_ROWS: usize = 10_000;

/// Outcome of one executed plan.
#[derive(Debug)]
pub enum ExecutionResult {
    /// Table registered in the catalog.
    Created,
    /// Number of rows written as one data file.
    Inserted(usize),
    /// Merged query result.
    Rows(RecordBatch),
}

/// Dispatches plans against a catalog and a storage backend.
pub struct ExecutionEngine {
    catalog: TableCatalog,
    storage: Box<dyn DataStorage>,
}

impl ExecutionEngine {
    pub fn new(catalog: TableCatalog, storage: Box<dyn DataStorage>) -> Self {
        Self { catalog, storage }
    }

    /// Open the catalog and construct the configured backend.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let catalog = TableCatalog::open(&settings.catalog_path, settings.data_root.clone())?;
        let storage = storage_for(settings)?;
        Ok(Self::new(catalog, storage))
    }

    pub fn catalog(&self) -> &TableCatalog {
        &self.catalog
    }

    pub fn execute(&mut self, plan: &Plan) -> Result<ExecutionResult> {
        match plan {
            Plan::CreateTable(p) => self.execute_create(p),
            Plan::Insert(p) => self.execute_insert(p),
            Plan::Select(p) => self.execute_select(p),
        }
    }

    fn execute_create(&mut self, plan: &CreateTablePlan) -> Result<ExecutionResult> {
        // No storage side effect: the table's directory comes into existence
        // lazily on first insert.
        self.catalog
            .create_table(&plan.table_name, plan.columns.clone())?;
        Ok(ExecutionResult::Created)
    }

    fn execute_insert(&mut self, plan: &InsertPlan) -> Result<ExecutionResult> {
        let table = &plan.table_name;
        let schema = self.catalog.get_schema(table)?;
        log::debug!(
            "insert into '{}': {} rows, adapter inferred {:?}",
            table,
            plan.rows.len(),
            plan.inferred_types
        );

        let order = column_order(table, schema, plan.column_names.as_deref())?;
        for (i, row) in plan.rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(LakeError::SchemaMismatch(format!(
                    "row {} has {} values, table '{}' has {} columns",
                    i,
                    row.len(),
                    table,
                    schema.len()
                )));
            }
        }

        let batch = batch_from_rows(schema, &plan.rows, order.as_deref())?;
        let rows = batch.num_rows();
        self.storage.write(table, &batch, Utc::now().date_naive())?;
        Ok(ExecutionResult::Inserted(rows))
    }

    fn execute_select(&self, plan: &SelectPlan) -> Result<ExecutionResult> {
        let table = match plan.table_names.as_slice() {
            [single] => single,
            [] => return Err(LakeError::Unsupported("SELECT without a table".to_string())),
            _ => {
                return Err(LakeError::Unsupported(
                    "multi-table SELECT is not supported".to_string(),
                ))
            }
        };
        let schema = self.catalog.get_schema(table)?;

        // Projection is validated against the catalog before any storage
        // access: a bad column name must never trigger a scan.
        let requested = plan
            .projections
            .as_ref()
            .and_then(|p| p.first())
            .filter(|cols| !cols.is_empty());
        let projection = match requested {
            Some(cols) => Some(canonical_columns(table, schema, cols)?),
            None => None,
        };

        let batch = self
            .storage
            .read(table, projection.as_deref(), Some(MAX_RESULT_ROWS))?;
        Ok(ExecutionResult::Rows(batch))
    }
}

/// Resolve an explicit insert column list against the schema.
///
/// Returns, for each schema column index, the position of its value within a
/// row. `None` means the rows are already in schema order.
fn column_order(
    table: &str,
    schema: &TableSchema,
    column_names: Option<&[String]>,
) -> Result<Option<Vec<usize>>> {
    let Some(names) = column_names else {
        return Ok(None);
    };

    let unknown: Vec<String> = names
        .iter()
        .filter(|n| !schema.has_column(n))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(LakeError::UnknownColumns {
            table: table.to_string(),
            columns: unknown,
        });
    }

    let mut order = Vec::with_capacity(schema.len());
    for col in schema.columns() {
        let pos = names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(&col.name))
            .ok_or_else(|| {
                LakeError::SchemaMismatch(format!(
                    "INSERT into '{}' must name every column; '{}' is missing",
                    table, col.name
                ))
            })?;
        order.push(pos);
    }
    if names.len() != schema.len() {
        return Err(LakeError::SchemaMismatch(format!(
            "INSERT names {} columns, table '{}' has {}",
            names.len(),
            table,
            schema.len()
        )));
    }
    Ok(Some(order))
}

/// Validate projected names against the catalog schema, collecting every
/// offending name, and canonicalize the survivors to their declared case.
fn canonical_columns(table: &str, schema: &TableSchema, cols: &[String]) -> Result<Vec<String>> {
    let unknown: Vec<String> = cols
        .iter()
        .filter(|c| !schema.has_column(c))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(LakeError::UnknownColumns {
            table: table.to_string(),
            columns: unknown,
        });
    }
    Ok(cols
        .iter()
        .map(|c| {
            schema
                .column(c)
                .map(|def| def.name.clone())
                .unwrap_or_else(|| c.clone())
        })
        .collect())
}
