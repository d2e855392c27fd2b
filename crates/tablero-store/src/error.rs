//! Store error types.

use thiserror::Error;

/// Errors raised by the entity store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Write rejected: {0}")]
    WriteRejected(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
