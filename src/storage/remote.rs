//! Remote object-store storage backend.
//!
//! Same logical key layout as the local backend, addressed through the
//! `object_store` API. A single-shot `put` publishes each file atomically;
//! the store never exposes a partially-uploaded object.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore, PutPayload};
use tokio::runtime::Runtime;

use super::codec;
use super::{
    data_file_name, merge_batches, partition_dir, ConnectionProvider, DataFileHandle, DataStorage,
};
use crate::config::Settings;
use crate::{LakeError, Result};

/// Stores data files as objects under `prefix/<table>/<YYYY-MM-DD>/`.
///
/// Every operation runs synchronously to completion on an internal
/// current-thread runtime; remote I/O fails outright rather than being
/// interrupted, matching the engine's no-timeout model.
pub struct RemoteStorage {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    runtime: Runtime,
}

impl RemoteStorage {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            store,
            prefix: prefix.into().trim_matches('/').to_string(),
            runtime,
        })
    }

    /// Build an S3-compatible backend from deployment settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let s3 = settings.s3.as_ref().ok_or_else(|| {
            LakeError::Config("s3 backend selected but no s3 settings provided".to_string())
        })?;

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(s3.bucket.as_str())
            .with_region(s3.region.as_str())
            .with_access_key_id(s3.access_key_id.as_str())
            .with_secret_access_key(s3.secret_access_key.as_str());
        // Custom endpoints (MinIO and friends) are usually plain HTTP.
        if let Some(endpoint) = &s3.endpoint {
            builder = builder.with_endpoint(endpoint.as_str()).with_allow_http(true);
        }

        let store = builder.build()?;
        Self::new(Arc::new(store), settings.data_root.clone())
    }

    fn table_prefix(&self, table: &str) -> ObjectPath {
        ObjectPath::from(format!("{}/{}", self.prefix, table))
    }

    /// Every data object under the table prefix, in key (write) order.
    fn data_objects(&self, table: &str) -> Result<Vec<ObjectMeta>> {
        let prefix = self.table_prefix(table);
        let mut metas: Vec<ObjectMeta> = self
            .runtime
            .block_on(self.store.list(Some(&prefix)).try_collect())?;
        metas.retain(|m| m.location.extension() == Some("parquet"));
        metas.sort_by(|a, b| a.location.as_ref().cmp(b.location.as_ref()));
        Ok(metas)
    }
}

impl ConnectionProvider for RemoteStorage {
    fn object_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }
}

impl DataStorage for RemoteStorage {
    fn write(
        &self,
        table: &str,
        batch: &RecordBatch,
        partition: NaiveDate,
    ) -> Result<DataFileHandle> {
        let bytes = codec::encode_batch(batch)?;
        let key = ObjectPath::from(format!(
            "{}/{}/{}/{}",
            self.prefix,
            table,
            partition_dir(partition),
            data_file_name()
        ));

        self.runtime
            .block_on(self.store.put(&key, PutPayload::from(bytes)))?;

        log::info!("{} rows written to {}", batch.num_rows(), key);
        Ok(DataFileHandle {
            location: key.to_string(),
            rows: batch.num_rows() as u64,
        })
    }

    fn read(
        &self,
        table: &str,
        columns: Option<&[String]>,
        limit: Option<usize>,
    ) -> Result<RecordBatch> {
        let objects = self.data_objects(table)?;
        if objects.is_empty() {
            return Err(LakeError::DataNotFound(table.to_string()));
        }
        log::debug!("table '{}' has {} data objects", table, objects.len());

        let mut batches = Vec::new();
        for meta in &objects {
            let bytes = self.runtime.block_on(async {
                self.store.get(&meta.location).await?.bytes().await
            })?;
            batches.extend(codec::decode_file(bytes, columns, meta.location.as_ref())?);
        }
        merge_batches(table, batches, columns, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field, Schema};
    use object_store::memory::InMemory;

    fn sample_batch(ids: &[i64]) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(ids.to_vec()))]).unwrap()
    }

    fn storage() -> RemoteStorage {
        RemoteStorage::new(Arc::new(InMemory::new()), "data").unwrap()
    }

    fn today() -> NaiveDate {
        chrono::Utc::now().date_naive()
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let storage = storage();
        let handle = storage
            .write("t", &sample_batch(&[10, 20]), today())
            .unwrap();
        assert_eq!(handle.rows, 2);
        assert!(handle.location.starts_with("data/t/"));

        let result = storage.read("t", None, None).unwrap();
        let ids = result
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(ids.values(), &[10, 20]);
    }

    #[test]
    fn test_multiple_objects_merge() {
        let storage = storage();
        storage.write("t", &sample_batch(&[1]), today()).unwrap();
        storage.write("t", &sample_batch(&[2]), today()).unwrap();

        let result = storage.read("t", None, None).unwrap();
        assert_eq!(result.num_rows(), 2);
    }

    #[test]
    fn test_empty_table_read_fails() {
        let storage = storage();
        assert!(matches!(
            storage.read("missing", None, None),
            Err(LakeError::DataNotFound(_))
        ));
    }

    #[test]
    fn test_key_layout() {
        let storage = storage();
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let handle = storage.write("events", &sample_batch(&[1]), d).unwrap();
        assert!(handle.location.starts_with("data/events/2024-03-07/raw_"));
    }

    #[test]
    fn test_connection_provider_exposes_store() {
        let storage = storage();
        storage.write("t", &sample_batch(&[1]), today()).unwrap();

        let store = storage.object_store();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let metas: Vec<ObjectMeta> = runtime
            .block_on(store.list(None).try_collect())
            .unwrap();
        assert_eq!(metas.len(), 1);
    }
}
