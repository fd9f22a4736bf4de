//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("token issuance failed: {0}")]
    IssuanceFailed(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("identity store error: {0}")]
    Identity(#[from] gatehouse_identity::IdentityError),

    #[error("media store error: {0}")]
    Media(#[from] gatehouse_media::MediaError),
}

impl ApiError {
    /// Get the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::UploadFailed(_) => "upload_failed",
            Self::IssuanceFailed(_) => "issuance_failed",
            Self::Internal(_) => "internal_error",
            Self::Identity(e) => match e {
                gatehouse_identity::IdentityError::NotFound(_) => "not_found",
                gatehouse_identity::IdentityError::AlreadyExists(_) => "conflict",
                _ => "identity_store_error",
            },
            Self::Media(e) => match e {
                gatehouse_media::MediaError::UploadFailed(_) => "upload_failed",
                _ => "media_store_error",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            Self::IssuanceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Identity(e) => match e {
                gatehouse_identity::IdentityError::NotFound(_) => StatusCode::NOT_FOUND,
                gatehouse_identity::IdentityError::AlreadyExists(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Media(e) => match e {
                gatehouse_media::MediaError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Full detail stays in the logs; server faults get a generic
        // message so internals never leak to callers.
        let message = if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            code: self.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
