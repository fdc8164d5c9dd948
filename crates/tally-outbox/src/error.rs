//! Outbox error types.

use thiserror::Error;

/// Outbox error type.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// Persistence error
    #[error("Storage error: {0}")]
    Storage(#[from] tally_storage::StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Transport failure outside of HTTP
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;
