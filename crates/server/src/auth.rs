//! Authentication guard middleware.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use gatehouse_identity::IdentityRow;
use serde::Serialize;
use uuid::Uuid;

/// Identity context attached to an authenticated request.
///
/// Deliberately excludes `secret_hash` and `refresh_token`: downstream
/// handlers get the least exposure that still serves them.
#[derive(Clone, Debug, Serialize)]
pub struct CurrentIdentity {
    pub identity_id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
}

impl From<&IdentityRow> for CurrentIdentity {
    fn from(row: &IdentityRow) -> Self {
        Self {
            identity_id: row.identity_id,
            username: row.username.clone(),
            email: row.email.clone(),
            display_name: row.display_name.clone(),
            avatar_url: row.avatar_url.clone(),
            cover_url: row.cover_url.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentIdentity>()
            .cloned()
            .ok_or_else(unauthenticated)
    }
}

/// Extract bearer token from the Authorization header.
/// Per RFC 6750, the "Bearer" scheme is case-insensitive.
fn extract_bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(&v[7..])
            } else {
                None
            }
        })
}

/// Guard middleware: verifies a presented access token and attaches
/// the resolved identity context. A pure read, no state mutation.
///
/// Absent or bad tokens do not fail the request here; protected
/// handlers reject via the [`CurrentIdentity`] extractor so public
/// routes stay usable through the same stack.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_bearer_token(&req) {
        match state.codec.verify_access(token) {
            Ok(claims) => match state.identities.find_by_id(claims.sub).await? {
                Some(row) => {
                    req.extensions_mut().insert(CurrentIdentity::from(&row));
                }
                None => {
                    // Deleted after issuance; the token is a dangling reference.
                    tracing::debug!(identity_id = %claims.sub, "access token for missing identity");
                }
            },
            Err(e) if e.is_expired() => {
                tracing::debug!("access token expired");
            }
            Err(e) => {
                tracing::debug!(error = %e, "access token invalid");
            }
        }
    }

    Ok(next.run(req).await)
}

fn unauthenticated() -> ApiError {
    ApiError::Unauthenticated("authentication required".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_auth(value: &str) -> Request {
        let mut req = Request::new(Body::empty());
        req.headers_mut()
            .insert(AUTHORIZATION, value.parse().unwrap());
        req
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        let req = request_with_auth("BEARER abc.def.ghi");
        assert_eq!(extract_bearer_token(&req), Some("abc.def.ghi"));

        let req = request_with_auth("bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&req), Some("abc.def.ghi"));
    }

    #[test]
    fn test_non_bearer_scheme_ignored() {
        let req = request_with_auth("Basic dXNlcjpwYXNz");
        assert_eq!(extract_bearer_token(&req), None);

        let req = Request::new(Body::empty());
        assert_eq!(extract_bearer_token(&req), None);
    }

}
