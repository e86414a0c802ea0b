//! Error types for the snapshot writer crate

use thiserror::Error;

/// Errors that can occur while writing or verifying snapshot files
#[derive(Debug, Error)]
pub enum WriterError {
    /// Storage operator could not be constructed
    #[error("Failed to initialize storage at '{root}': {reason}")]
    StorageInit { root: String, reason: String },

    /// Parquet encoding failed
    #[error("Failed to encode snapshot '{file}': {reason}")]
    Encode { file: String, reason: String },

    /// Upload to storage failed
    #[error("Failed to write snapshot '{file}': {reason}")]
    Write { file: String, reason: String },

    /// Listing the data directory failed
    #[error("Failed to list snapshot files: {0}")]
    List(String),

    /// A listed file could not be read back as Parquet
    #[error("Snapshot '{file}' is not readable as Parquet: {reason}")]
    Unreadable { file: String, reason: String },
}

/// Result type alias for WriterError
pub type Result<T> = std::result::Result<T, WriterError>;
