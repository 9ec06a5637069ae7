//! Parquet encode/decode shared by all backends.
//!
//! A batch is always serialized to an in-memory buffer first; backends then
//! publish the bytes atomically (temp-file rename locally, single-shot put
//! remotely), so a reader can never observe a partially-written file.

use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::{LakeError, Result};

/// Serialize one batch into a complete Parquet file in memory.
pub(crate) fn encode_batch(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(buffer)
}

/// Decode every record batch from one Parquet file, optionally projecting
/// columns by name (case-insensitive against the file schema).
///
/// Any structural problem in the file surfaces as `StorageCorruption`
/// carrying `source` for context; partial results are never returned.
pub(crate) fn decode_file(
    bytes: Bytes,
    columns: Option<&[String]>,
    source: &str,
) -> Result<Vec<RecordBatch>> {
    let corrupt = |detail: String| LakeError::StorageCorruption(format!("{}: {}", source, detail));

    let mut builder =
        ParquetRecordBatchReaderBuilder::try_new(bytes).map_err(|e| corrupt(e.to_string()))?;

    if let Some(names) = columns {
        let file_schema = builder.schema().clone();
        let indices = names
            .iter()
            .map(|name| {
                file_schema
                    .fields()
                    .iter()
                    .position(|f| f.name().eq_ignore_ascii_case(name))
                    .ok_or_else(|| corrupt(format!("missing column '{}'", name)))
            })
            .collect::<Result<Vec<_>>>()?;
        let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
        builder = builder.with_projection(mask);
    }

    let reader = builder.build().map_err(|e| corrupt(e.to_string()))?;
    reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| corrupt(e.to_string()))
}
