//! Error types for the warehouse API client

use thiserror::Error;

/// Errors that can occur while fetching entity snapshots
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    /// The configured base URL or a built query URL is not valid
    #[error("Invalid query URL for '{query_id}': {reason}")]
    InvalidUrl { query_id: String, reason: String },

    /// A query exhausted its retry budget
    #[error("Query '{query_id}' failed after {attempts} attempts: {reason}")]
    QueryFailed {
        query_id: String,
        attempts: u32,
        reason: String,
    },

    /// The API answered with something other than a JSON array of rows
    #[error("Query '{query_id}' returned an unexpected response shape")]
    UnexpectedShape { query_id: String },
}

/// Result type alias for ClientError
pub type Result<T> = std::result::Result<T, ClientError>;
