//! Session endpoints: register, login, refresh, logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentIdentity;
use crate::error::{ApiError, ApiResult};
use crate::session::Registration;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub secret: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub identifier: String,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response for endpoints that open or rotate a session.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub identity: CurrentIdentity,
    pub access_token: String,
    pub refresh_token: String,
}

/// POST /v1/session/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<CurrentIdentity>)> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();
    let display_name = req.display_name.trim().to_string();

    if username.is_empty() || email.is_empty() || display_name.is_empty() {
        return Err(ApiError::Validation(
            "username, email and display_name must be non-empty".to_string(),
        ));
    }
    if req.secret.is_empty() {
        return Err(ApiError::Validation("secret must be non-empty".to_string()));
    }

    let row = state
        .sessions
        .register(Registration {
            username,
            email,
            secret: req.secret,
            display_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CurrentIdentity::from(&row))))
}

/// POST /v1/session/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    if req.identifier.trim().is_empty() {
        return Err(ApiError::Validation(
            "identifier must be non-empty".to_string(),
        ));
    }

    let (row, pair) = state.sessions.login(req.identifier.trim(), &req.secret).await?;

    Ok(Json(SessionResponse {
        identity: CurrentIdentity::from(&row),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// POST /v1/session/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let (row, pair) = state.sessions.refresh(&req.refresh_token).await?;

    Ok(Json(SessionResponse {
        identity: CurrentIdentity::from(&row),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// POST /v1/session/logout
pub async fn logout(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> ApiResult<StatusCode> {
    state.sessions.logout(identity.identity_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
