//! Table catalog module
//!
//! The durable registry mapping table names to schemas and physical storage
//! locations. Sole authority for table existence and column types.

mod catalog;

pub use catalog::{
    CatalogEntry, ColumnDef, StorageDescriptor, StorageFormat, TableCatalog, TableSchema,
};
