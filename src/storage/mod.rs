//! Storage module - partitioned Parquet data files.
//!
//! A [`DataStorage`] backend writes one immutable Parquet file per insert
//! batch under `root/<table>/<YYYY-MM-DD>/` and merges every file back into
//! one logical result on read. Two backends share the layout: a local
//! filesystem one and a remote object-store one.

mod codec;
mod local;
mod remote;

pub use local::LocalStorage;
pub use remote::RemoteStorage;

use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, Utc};
use object_store::ObjectStore;
use uuid::Uuid;

use crate::config::{BackendKind, Settings};
use crate::{LakeError, Result};

/// Handle to a data file produced by one write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFileHandle {
    /// Backend-specific location (path or object key).
    pub location: String,
    /// Number of rows in the file.
    pub rows: u64,
}

/// Capability interface for writing and reading partitioned columnar data.
///
/// Contract obligations on every implementation:
/// - a file becomes visible to readers only in its fully-written state;
/// - file names stay collision-free under concurrent writers;
/// - a read of a table with zero data files fails with `DataNotFound`;
/// - an unreadable file aborts the whole read with `StorageCorruption`.
pub trait DataStorage {
    /// Write one batch as a single immutable data file under the
    /// ingestion-date partition.
    fn write(
        &self,
        table: &str,
        batch: &RecordBatch,
        partition: NaiveDate,
    ) -> Result<DataFileHandle>;

    /// Merge every data file of the table into one batch, optionally
    /// projecting columns and capping the row count. The cap applies after
    /// full logical materialization, not per file.
    fn read(
        &self,
        table: &str,
        columns: Option<&[String]>,
        limit: Option<usize>,
    ) -> Result<RecordBatch>;
}

/// Capability of backends that hold a remote client connection.
pub trait ConnectionProvider {
    fn object_store(&self) -> Arc<dyn ObjectStore>;
}

/// Construct the configured backend.
pub fn storage_for(settings: &Settings) -> Result<Box<dyn DataStorage>> {
    match settings.backend {
        BackendKind::Local => Ok(Box::new(LocalStorage::new(&settings.data_root))),
        BackendKind::S3 => Ok(Box::new(RemoteStorage::from_settings(settings)?)),
    }
}

/// Unique data file name: UTC second timestamp plus a random token.
///
/// The timestamp keeps names sortable in write order; the token keeps them
/// collision-free at sub-second concurrency, which second granularity alone
/// cannot guarantee.
pub(crate) fn data_file_name() -> String {
    format!(
        "raw_{}_{}.parquet",
        Utc::now().format("%Y%m%d%H%M%S"),
        Uuid::new_v4().simple()
    )
}

pub(crate) fn partition_dir(partition: NaiveDate) -> String {
    partition.format("%Y-%m-%d").to_string()
}

/// Concatenate per-file batches column-wise, reorder to the requested
/// projection, and apply the row cap.
pub(crate) fn merge_batches(
    table: &str,
    batches: Vec<RecordBatch>,
    columns: Option<&[String]>,
    limit: Option<usize>,
) -> Result<RecordBatch> {
    let first = batches
        .first()
        .ok_or_else(|| LakeError::DataNotFound(table.to_string()))?;
    let schema = first.schema();
    let mut merged = concat_batches(&schema, batches.iter()).map_err(|e| {
        LakeError::StorageCorruption(format!(
            "inconsistent data files under table '{}': {}",
            table, e
        ))
    })?;

    // Projection masks keep file column order; reorder to the request.
    if let Some(names) = columns {
        let indices = names
            .iter()
            .map(|name| {
                schema
                    .fields()
                    .iter()
                    .position(|f| f.name().eq_ignore_ascii_case(name))
                    .ok_or_else(|| {
                        LakeError::StorageCorruption(format!(
                            "column '{}' missing from data files of table '{}'",
                            name, table
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        merged = merged.project(&indices)?;
    }

    if let Some(cap) = limit {
        if merged.num_rows() > cap {
            merged = merged.slice(0, cap);
        }
    }

    log::debug!("read {} rows from table '{}'", merged.num_rows(), table);
    Ok(merged)
}
