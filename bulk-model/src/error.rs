//! Error types for storage backends.

use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors a storage backend can report.
///
/// Validation failures are not errors: they are recorded on the
/// [`Record`](crate::Record) and reported per item by the engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend cannot serve requests (lost connection, poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend refused data it cannot represent.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
