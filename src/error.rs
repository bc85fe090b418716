//! Error types for Post Box.

use thiserror::Error;

/// Common error type for Post Box.
///
/// Expected, user-facing send failures (cooldown, empty content, moderation
/// rejection) are not errors; see [`crate::delivery::DeliveryOutcome`].
#[derive(Error, Debug)]
pub enum PostboxError {
    /// Database error.
    ///
    /// Wraps failures of the key-value persistence backend. A failed write
    /// leaves the in-memory stores unchanged, so the operation can be retried.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Resource conflict (e.g. postal code space exhausted).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Moderation client setup error.
    #[error("moderation error: {0}")]
    Moderation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for PostboxError {
    fn from(e: sqlx::Error) -> Self {
        PostboxError::Database(e.to_string())
    }
}

/// Result type alias for Post Box operations.
pub type Result<T> = std::result::Result<T, PostboxError>;
