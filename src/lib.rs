//! Lakelet Core Runtime
//!
//! A minimal open-table-format runtime implemented in Rust: a durable table
//! catalog describing schemas and physical layout, plus a pluggable storage
//! engine that writes and reads date-partitioned Parquet data on behalf of
//! three operation kinds (create table, insert rows, select rows).
//!
//! Lakelet is embedded by its host process; it defines no wire protocol and
//! performs no SQL parsing. An external parser adapter hands over typed
//! [`Plan`] descriptors which the [`ExecutionEngine`] executes against the
//! [`TableCatalog`] and a [`DataStorage`] backend.

pub mod config;
pub mod data;
pub mod query;
pub mod storage;
pub mod table;

// Re-export main types
pub use config::{BackendKind, Settings};
pub use data::{LogicalType, Value};
pub use query::{
    CreateTablePlan, ExecutionEngine, ExecutionResult, InsertPlan, Plan, SelectPlan,
    MAX_RESULT_ROWS,
};
pub use storage::{
    storage_for, ConnectionProvider, DataFileHandle, DataStorage, LocalStorage, RemoteStorage,
};
pub use table::{
    CatalogEntry, ColumnDef, StorageDescriptor, StorageFormat, TableCatalog, TableSchema,
};

/// Runtime error type
#[derive(Debug, thiserror::Error)]
pub enum LakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("No data files found for table: {0}")]
    DataNotFound(String),

    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Column already exists: {0}")]
    ColumnExists(String),

    #[error("Unknown column(s) {columns:?} in table '{table}'")]
    UnknownColumns { table: String, columns: Vec<String> },

    #[error("Cannot coerce value '{value}' into {expected} column '{column}'")]
    TypeCoercion {
        column: String,
        value: String,
        expected: data::LogicalType,
    },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Storage corruption: {0}")]
    StorageCorruption(String),

    #[error("Catalog corruption: {0}")]
    CatalogCorruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, LakeError>;
