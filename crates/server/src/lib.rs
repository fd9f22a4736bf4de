//! HTTP server for the Gatehouse session service.
//!
//! Wires the identity store, token codec, and media uploader behind an
//! axum router: session lifecycle endpoints, an authentication guard,
//! and transactional profile-image uploads.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;

pub use auth::CurrentIdentity;
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use session::{Registration, SessionService};
pub use state::AppState;
