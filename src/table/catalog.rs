//! Durable table catalog.
//!
//! The catalog is persisted as a single JSON document mapping table name to
//! schema and storage descriptor. It is loaded fully into memory at open and
//! rewritten in full on every mutation; the persisted document is canonical
//! and the in-memory map is a cache kept consistent with each successful
//! mutation. There is no incremental log.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::LogicalType;
use crate::{LakeError, Result};

/// Physical file format of a table's data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    Parquet,
}

/// A single column: name plus declared logical type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub logical_type: LogicalType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
        }
    }
}

/// Ordered column list of a table.
///
/// Column names are unique under case-insensitive comparison; the original
/// case is preserved as declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a column by name, case-insensitively.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Where and how a table's data files live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageDescriptor {
    pub format: StorageFormat,
    pub root_location: String,
}

/// Everything the catalog knows about one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub schema: TableSchema,
    pub storage: StorageDescriptor,
}

/// The table catalog: table name -> [`CatalogEntry`].
///
/// A name maps to at most one entry at any time. Entries are created by
/// `create_table`, never mutated by inserts, and removed only through
/// `drop_table` (an extension point no plan currently reaches).
#[derive(Debug)]
pub struct TableCatalog {
    path: PathBuf,
    data_root: String,
    tables: BTreeMap<String, CatalogEntry>,
}

impl TableCatalog {
    /// Open the catalog document at `path`, creating an empty catalog if no
    /// document exists yet.
    ///
    /// A present-but-malformed document fails with `CatalogCorruption`;
    /// silently starting empty would orphan every existing table.
    pub fn open(path: impl Into<PathBuf>, data_root: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let tables = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let tables: BTreeMap<String, CatalogEntry> = serde_json::from_str(&raw)
                .map_err(|e| {
                    LakeError::CatalogCorruption(format!("{}: {}", path.display(), e))
                })?;
            log::info!(
                "loaded catalog from {} ({} tables)",
                path.display(),
                tables.len()
            );
            tables
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            log::info!("no catalog at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            data_root: data_root.into(),
            tables,
        })
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn get_entry(&self, name: &str) -> Result<&CatalogEntry> {
        self.tables
            .get(name)
            .ok_or_else(|| LakeError::TableNotFound(name.to_string()))
    }

    pub fn get_schema(&self, name: &str) -> Result<&TableSchema> {
        Ok(&self.get_entry(name)?.schema)
    }

    /// All table names, sorted.
    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Register a new table and persist the catalog.
    ///
    /// Physical storage is untouched here; the table's directory comes into
    /// existence lazily on first insert.
    pub fn create_table(&mut self, name: &str, columns: Vec<ColumnDef>) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(LakeError::TableExists(name.to_string()));
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&col.name))
            {
                return Err(LakeError::ColumnExists(col.name.clone()));
            }
        }

        let entry = CatalogEntry {
            schema: TableSchema::new(columns),
            storage: StorageDescriptor {
                format: StorageFormat::Parquet,
                root_location: format!("{}/{}", self.data_root.trim_end_matches('/'), name),
            },
        };

        self.tables.insert(name.to_string(), entry);
        if let Err(e) = self.save() {
            self.tables.remove(name);
            return Err(e);
        }
        log::info!("created table '{}'", name);
        Ok(())
    }

    /// Remove a table's entry and persist the catalog.
    ///
    /// Data files are deliberately left in place; there is no deletion or
    /// compaction path.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let entry = self
            .tables
            .remove(name)
            .ok_or_else(|| LakeError::TableNotFound(name.to_string()))?;
        if let Err(e) = self.save() {
            self.tables.insert(name.to_string(), entry);
            return Err(e);
        }
        log::info!("dropped table '{}'", name);
        Ok(())
    }

    /// Rewrite the whole document atomically: serialize to a temporary file,
    /// flush it to disk, then rename over the live document. A crash mid-write
    /// leaves either the old or the new catalog visible, never a torn one.
    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.tables)
            .map_err(|e| LakeError::Serialization(e.to_string()))?;

        let tmp = tmp_path(&self.path);
        {
            let mut file = File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", LogicalType::Integer),
            ColumnDef::new("Name", LogicalType::Text),
        ]
    }

    #[test]
    fn test_create_then_exists() {
        let dir = tempdir().unwrap();
        let mut catalog = TableCatalog::open(dir.path().join("catalog.json"), "data").unwrap();

        assert!(!catalog.table_exists("users"));
        catalog.create_table("users", columns()).unwrap();
        assert!(catalog.table_exists("users"));

        let entry = catalog.get_entry("users").unwrap();
        assert_eq!(entry.storage.format, StorageFormat::Parquet);
        assert_eq!(entry.storage.root_location, "data/users");
    }

    #[test]
    fn test_duplicate_create_preserves_entry() {
        let dir = tempdir().unwrap();
        let mut catalog = TableCatalog::open(dir.path().join("catalog.json"), "data").unwrap();

        catalog.create_table("users", columns()).unwrap();
        let before = catalog.get_entry("users").unwrap().clone();

        let err = catalog
            .create_table("users", vec![ColumnDef::new("other", LogicalType::Float)])
            .unwrap_err();
        assert!(matches!(err, LakeError::TableExists(ref n) if n == "users"));
        assert_eq!(catalog.get_entry("users").unwrap(), &before);
    }

    #[test]
    fn test_duplicate_column_case_insensitive() {
        let dir = tempdir().unwrap();
        let mut catalog = TableCatalog::open(dir.path().join("catalog.json"), "data").unwrap();

        let cols = vec![
            ColumnDef::new("id", LogicalType::Integer),
            ColumnDef::new("ID", LogicalType::Text),
        ];
        let err = catalog.create_table("t", cols).unwrap_err();
        assert!(matches!(err, LakeError::ColumnExists(ref n) if n == "ID"));
        assert!(!catalog.table_exists("t"));
    }

    #[test]
    fn test_schema_lookup_preserves_case() {
        let dir = tempdir().unwrap();
        let mut catalog = TableCatalog::open(dir.path().join("catalog.json"), "data").unwrap();
        catalog.create_table("t", columns()).unwrap();

        let schema = catalog.get_schema("t").unwrap();
        let col = schema.column("name").unwrap();
        assert_eq!(col.name, "Name");
        assert!(schema.has_column("NAME"));
        assert!(!schema.has_column("missing"));
    }

    #[test]
    fn test_roundtrip_through_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        {
            let mut catalog = TableCatalog::open(&path, "data").unwrap();
            catalog.create_table("a", columns()).unwrap();
            catalog
                .create_table(
                    "b",
                    vec![
                        ColumnDef::new("ts", LogicalType::Date),
                        ColumnDef::new("ok", LogicalType::Boolean),
                        ColumnDef::new("score", LogicalType::Float),
                    ],
                )
                .unwrap();
        }

        let reloaded = TableCatalog::open(&path, "data").unwrap();
        assert_eq!(reloaded.list_tables(), vec!["a", "b"]);
        assert_eq!(
            reloaded.get_schema("a").unwrap(),
            &TableSchema::new(columns())
        );
        assert_eq!(
            reloaded
                .get_schema("b")
                .unwrap()
                .column("score")
                .unwrap()
                .logical_type,
            LogicalType::Float
        );
    }

    #[test]
    fn test_malformed_document_fails_fast() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "{ not json").unwrap();

        let err = TableCatalog::open(&path, "data").unwrap_err();
        assert!(matches!(err, LakeError::CatalogCorruption(_)));
    }

    #[test]
    fn test_drop_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let mut catalog = TableCatalog::open(&path, "data").unwrap();

        catalog.create_table("t", columns()).unwrap();
        catalog.drop_table("t").unwrap();
        assert!(!catalog.table_exists("t"));

        let err = catalog.drop_table("t").unwrap_err();
        assert!(matches!(err, LakeError::TableNotFound(_)));

        // Drop is durable.
        let reloaded = TableCatalog::open(&path, "data").unwrap();
        assert!(!reloaded.table_exists("t"));
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let mut catalog = TableCatalog::open(&path, "data").unwrap();
        catalog.create_table("t", columns()).unwrap();

        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_missing_table_errors() {
        let dir = tempdir().unwrap();
        let catalog = TableCatalog::open(dir.path().join("catalog.json"), "data").unwrap();
        assert!(matches!(
            catalog.get_schema("ghost"),
            Err(LakeError::TableNotFound(_))
        ));
    }
}
