//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("token expired")]
    TokenExpired,

    #[error("hashing failure: {0}")]
    Hashing(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this error means the token is structurally fine but past
    /// its expiry. Callers use this to prompt a refresh instead of a
    /// full re-login.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::TokenExpired)
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
