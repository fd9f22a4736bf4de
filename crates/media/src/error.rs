//! Media store error types.

use thiserror::Error;

/// Media storage operation errors.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for media operations.
pub type MediaResult<T> = std::result::Result<T, MediaError>;
