//! Core snapshot write path
//!
//! Encodes an Arrow RecordBatch to Parquet bytes in memory and uploads the
//! result under the contract filename `<entity>_<snapshot-id>.parquet`.
//! A rerun with the same id overwrites the previous snapshot.

use crate::encoding::writer_properties;
use crate::error::{Result, WriterError};
use arrow::array::RecordBatch;
use opendal::Operator;
use wms2parquet_core::{snapshot_file_name, Entity};

/// Parquet writer for entity snapshots
pub struct SnapshotWriter {
    operator: Operator,
}

impl SnapshotWriter {
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }

    /// Write one entity snapshot.
    ///
    /// Returns the filename and the number of rows written. An empty batch
    /// still produces a valid (zero-row) Parquet file, so every run leaves
    /// all five entity files in place.
    pub async fn write_snapshot(
        &self,
        entity: Entity,
        snapshot_id: &str,
        batch: &RecordBatch,
    ) -> Result<(String, usize)> {
        let file = snapshot_file_name(entity, snapshot_id);
        let row_count = batch.num_rows();

        let mut buffer = Vec::new();
        {
            let props = writer_properties().clone();
            let mut writer =
                parquet::arrow::ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))
                    .map_err(|e| WriterError::Encode {
                        file: file.clone(),
                        reason: e.to_string(),
                    })?;

            writer.write(batch).map_err(|e| WriterError::Encode {
                file: file.clone(),
                reason: e.to_string(),
            })?;
            writer.close().map_err(|e| WriterError::Encode {
                file: file.clone(),
                reason: e.to_string(),
            })?;
        }

        self.operator
            .write(&file, buffer)
            .await
            .map_err(|e| WriterError::Write {
                file: file.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(file = %file, rows = row_count, "Snapshot written");
        Ok((file, row_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use opendal::services;
    use serde_json::json;
    use wms2parquet_core::{rows_to_record_batch, LoadContext};

    fn memory_operator() -> Operator {
        Operator::new(services::Memory::default()).unwrap().finish()
    }

    fn sample_batch(rows: usize) -> RecordBatch {
        let values: Vec<_> = (0..rows)
            .map(|i| json!({"ctxn_document_number": format!("D-{i}")}))
            .collect();
        let ctx = LoadContext::new("sales_orders", Some("1145"), Utc::now());
        rows_to_record_batch(&values, &ctx).unwrap()
    }

    #[tokio::test]
    async fn test_write_snapshot_produces_parquet() {
        let op = memory_operator();
        let writer = SnapshotWriter::new(op.clone());

        let (file, rows) = writer
            .write_snapshot(Entity::SalesOrders, "1145", &sample_batch(3))
            .await
            .unwrap();

        assert_eq!(file, "sales_orders_1145.parquet");
        assert_eq!(rows, 3);

        let bytes = op.read(&file).await.unwrap().to_vec();
        assert_eq!(&bytes[0..4], b"PAR1");
    }

    #[tokio::test]
    async fn test_rerun_overwrites_previous_snapshot() {
        let op = memory_operator();
        let writer = SnapshotWriter::new(op.clone());

        writer
            .write_snapshot(Entity::GoodsIssues, "1145", &sample_batch(5))
            .await
            .unwrap();
        writer
            .write_snapshot(Entity::GoodsIssues, "1145", &sample_batch(2))
            .await
            .unwrap();

        let reports = crate::verify::verify_snapshots(&op).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].rows, 2);
    }

    #[tokio::test]
    async fn test_empty_batch_still_writes_a_file() {
        let op = memory_operator();
        let writer = SnapshotWriter::new(op.clone());

        let (file, rows) = writer
            .write_snapshot(Entity::OutboundDeliveries, "20240301", &sample_batch(0))
            .await
            .unwrap();

        assert_eq!(rows, 0);
        assert!(op.exists(&file).await.unwrap());
    }
}
