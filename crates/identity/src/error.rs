//! Identity store error types.

use thiserror::Error;

/// Identity store operation errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for identity store operations.
pub type IdentityResult<T> = std::result::Result<T, IdentityError>;
