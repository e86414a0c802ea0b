//! Storage operator initialization
//!
//! Snapshots live in a single flat directory; the operator is rooted there
//! so file names are storage paths.

use crate::error::{Result, WriterError};
use wms2parquet_config::StorageConfig;

/// Build an OpenDAL operator rooted at the configured data directory.
pub fn init_operator(config: &StorageConfig) -> Result<opendal::Operator> {
    let fs_builder = opendal::services::Fs::default().root(&config.data_dir);
    let operator = opendal::Operator::new(fs_builder)
        .map_err(|e| WriterError::StorageInit {
            root: config.data_dir.clone(),
            reason: e.to_string(),
        })?
        .finish();

    tracing::debug!(root = %config.data_dir, "Storage operator initialized");
    Ok(operator)
}
