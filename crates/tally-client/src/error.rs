//! Client error types.

use thiserror::Error;

/// Client error type.
#[derive(Error, Debug)]
pub enum TallyError {
    /// Configuration or path error
    #[error("Config error: {0}")]
    Core(#[from] tally_config_and_utils::CoreError),

    /// Persistence error
    #[error("Storage error: {0}")]
    Storage(#[from] tally_storage::StorageError),

    /// Delivery setup error
    #[error("Outbox error: {0}")]
    Outbox(#[from] tally_outbox::OutboxError),

    /// Client was not started within the wait window
    #[error("Client not ready")]
    NotReady,
}

/// Result type alias using TallyError.
pub type TallyResult<T> = Result<T, TallyError>;
