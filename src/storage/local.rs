//! Local-filesystem storage backend.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use chrono::NaiveDate;

use super::codec;
use super::{data_file_name, merge_batches, partition_dir, DataFileHandle, DataStorage};
use crate::{LakeError, Result};

/// Stores data files under `root/<table>/<YYYY-MM-DD>/`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All data files under a table root, in name (write) order. A missing
    /// table directory is the same as an empty one.
    fn data_files(&self, table: &str) -> Result<Vec<PathBuf>> {
        let table_dir = self.root.join(table);
        let mut files = Vec::new();
        if table_dir.is_dir() {
            collect_parquet_files(&table_dir, &mut files)?;
        }
        files.sort();
        Ok(files)
    }
}

impl DataStorage for LocalStorage {
    fn write(
        &self,
        table: &str,
        batch: &RecordBatch,
        partition: NaiveDate,
    ) -> Result<DataFileHandle> {
        let dir = self.root.join(table).join(partition_dir(partition));
        fs::create_dir_all(&dir)?;

        let bytes = codec::encode_batch(batch)?;
        let name = data_file_name();
        let dest = dir.join(&name);

        // Readers must never see a partial file: write to a temp name in the
        // same directory, flush, then rename into place.
        let tmp = dir.join(format!("{}.tmp", name));
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &dest)?;

        log::info!(
            "{} rows written to {}",
            batch.num_rows(),
            dest.display()
        );
        Ok(DataFileHandle {
            location: dest.display().to_string(),
            rows: batch.num_rows() as u64,
        })
    }

    fn read(
        &self,
        table: &str,
        columns: Option<&[String]>,
        limit: Option<usize>,
    ) -> Result<RecordBatch> {
        let files = self.data_files(table)?;
        if files.is_empty() {
            return Err(LakeError::DataNotFound(table.to_string()));
        }
        log::debug!("table '{}' has {} data files", table, files.len());

        let mut batches = Vec::new();
        for path in &files {
            let bytes = Bytes::from(fs::read(path)?);
            batches.extend(codec::decode_file(
                bytes,
                columns,
                &path.display().to_string(),
            )?);
        }
        merge_batches(table, batches, columns, limit)
    }
}

fn collect_parquet_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_parquet_files(&path, out)?;
        } else if path.extension().is_some_and(|e| e == "parquet") {
            out.push(path);
        }
    }
    Ok(())
}
