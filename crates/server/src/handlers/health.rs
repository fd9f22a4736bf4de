//! Health endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub media_backend: &'static str,
}

/// GET /v1/health
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.identities.health_check().await?;
    state.uploader.store().health_check().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        media_backend: state.uploader.store().backend_name(),
    }))
}
