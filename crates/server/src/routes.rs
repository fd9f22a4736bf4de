//! Route table.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::handlers::{health, profile, sessions};
use crate::state::AppState;

/// Build the application router.
///
/// The guard middleware runs on every route; it only attaches identity
/// context, so public routes pass through untouched while protected
/// handlers reject unauthenticated callers via their extractor.
pub fn create_router(state: AppState) -> Router {
    let max_body = state.config.server.max_upload_bytes as usize;

    Router::new()
        .route("/v1/session/register", post(sessions::register))
        .route("/v1/session/login", post(sessions::login))
        .route("/v1/session/refresh", post(sessions::refresh))
        .route("/v1/session/logout", post(sessions::logout))
        .route("/v1/identity/me", get(profile::me))
        .route("/v1/identity/profile", patch(profile::update_profile))
        .route("/v1/identity/avatar", put(profile::upload_avatar))
        .route("/v1/identity/cover", put(profile::upload_cover))
        .route("/v1/health", get(health::health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}
