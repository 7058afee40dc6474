//! Error types for the bulk engine.
//!
//! Only request-wide conditions live here. Per-record failures (forbidden,
//! invalid) are data, collected in a [`ResultSet`](crate::ResultSet).

use bulk_model::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type BulkResult<T> = Result<T, BulkError>;

/// Conditions that abort a whole bulk request.
#[derive(Debug, Error)]
pub enum BulkError {
    /// The HTTP verb does not map to a bulk action.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// The request gate refused the request.
    #[error("request not authorized")]
    Unauthorized,

    /// Strict resolution: the request names a resource nobody declared.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// Neither an explicit binding nor name inference yields a model.
    #[error("no model `{model}` registered for resource `{resource}`")]
    UnresolvedModel { resource: String, model: String },

    /// The application was assembled inconsistently.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl BulkError {
    /// HTTP status the transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed(_) => 405,
            Self::Unauthorized => 401,
            Self::UnknownResource(_) => 400,
            Self::UnresolvedModel { .. } | Self::Config(_) | Self::Storage(_) => 500,
        }
    }
}
