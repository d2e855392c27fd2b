//! Centralized error types for Tablero.

use tablero_store::StoreError;
use thiserror::Error;

/// Main error type for board operations.
#[derive(Error, Debug)]
pub enum TableroError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Constraint violated: {0}")]
    ConstraintError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("CSV parse error: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for board operations.
pub type TableroResult<T> = Result<T, TableroError>;

impl TableroError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a CSV parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BoardNotFound(_) | Self::ColumnNotFound(_) | Self::CardNotFound(_)
        )
    }

    /// Message suitable for showing to a person rather than a log.
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationError(msg) | Self::ConstraintError(msg) | Self::ParseError(msg) => {
                msg.clone()
            }
            Self::BoardNotFound(id) => format!("The board '{}' does not exist.", id),
            Self::ColumnNotFound(id) => format!("The column '{}' does not exist.", id),
            Self::CardNotFound(id) => format!("The card '{}' does not exist.", id),
            Self::Store(_) | Self::Json(_) => {
                "The board store could not complete the request. Please try again.".to_string()
            }
            Self::Config(msg) => format!("Configuration problem: {}", msg),
        }
    }
}
