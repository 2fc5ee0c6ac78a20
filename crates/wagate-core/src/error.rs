//! Error types for wagate-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Provider-level failure
    #[error(transparent)]
    Provider(#[from] wagate_providers::Error),

    /// Requested row does not exist (or belongs to another tenant)
    #[error("not found: {0}")]
    NotFound(String),

    /// Session exists but is not active
    #[error("session inactive: {0}")]
    SessionInactive(String),

    /// Caller sent something unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal error (corrupt rows, cache, etc.)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error means "nothing there" rather than "something broke"
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
