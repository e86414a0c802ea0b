// wms2parquet-core - Platform-agnostic core logic
//
// This crate contains the PURE processing logic for turning warehouse API
// rows into Arrow record batches and naming the resulting snapshot files.
// No I/O, no async, no runtime dependencies.

use anyhow::Result;
use arrow::array::RecordBatch;

pub mod convert;
pub mod entity;
pub mod schema;

pub use convert::{LoadContext, RowConverter};
pub use entity::Entity;
pub use schema::{movement_snapshot_schema, movement_snapshot_schema_arc};

/// Build the snapshot filename for an entity: `<entity>_<snapshot-id>.parquet`
pub fn snapshot_file_name(entity: Entity, snapshot_id: &str) -> String {
    format!("{}_{}.parquet", entity.as_str(), snapshot_id)
}

/// Parse a snapshot filename back into its entity and snapshot id.
///
/// Entity names contain underscores, so the match is by known entity prefix
/// rather than by splitting on the last separator.
pub fn parse_snapshot_file_name(name: &str) -> Option<(Entity, &str)> {
    let stem = name.strip_suffix(".parquet")?;
    for entity in Entity::ALL {
        if let Some(rest) = stem.strip_prefix(entity.as_str()) {
            if let Some(id) = rest.strip_prefix('_') {
                if !id.is_empty() {
                    return Some((entity, id));
                }
            }
        }
    }
    None
}

/// Convert fetched JSON rows into an Arrow `RecordBatch`.
///
/// Deterministic for the same rows and load context; missing or
/// oddly-typed fields become nulls rather than errors.
pub fn rows_to_record_batch(rows: &[serde_json::Value], ctx: &LoadContext) -> Result<RecordBatch> {
    let mut converter = RowConverter::with_capacity(rows.len().max(1), ctx.clone());
    for row in rows {
        converter.add_row(row);
    }
    converter.finish()
}
