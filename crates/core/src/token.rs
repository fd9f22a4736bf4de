//! Signed session tokens: issuance and verification.
//!
//! Two token kinds exist. Access tokens are short-lived and carry
//! denormalized display fields so the request guard can build an
//! identity context without extra lookups. Refresh tokens are
//! long-lived, carry only the identity id, and are rotated on every
//! use. Each kind is signed with its own secret, so verifying a token
//! against the wrong kind fails as a signature error.

use crate::config::AuthConfig;
use crate::error::{Error, Result};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Token kind discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived, authorizes individual requests.
    Access,
    /// Long-lived, only mints new token pairs; rotated on each use.
    Refresh,
}

/// Claims carried by an access token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Identity id.
    pub sub: Uuid,
    /// Denormalized for fast guard checks.
    pub username: String,
    /// Denormalized for fast guard checks.
    pub display_name: String,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Claims carried by a refresh token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Identity id.
    pub sub: Uuid,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// An issued access/refresh pair. Tokens are immutable once issued;
/// they are never mutated, only replaced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies session tokens. Pure computation, no I/O.
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Build a codec from signing configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
        }
    }

    /// Issue an access token for an identity.
    pub fn issue_access(&self, sub: Uuid, username: &str, display_name: &str) -> Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = AccessClaims {
            sub,
            username: username.to_string(),
            display_name: display_name.to_string(),
            iat: now.unix_timestamp(),
            exp: (now + self.access_ttl).unix_timestamp(),
        };
        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| Error::TokenInvalid(format!("failed to sign access token: {e}")))
    }

    /// Issue a refresh token with the configured lifetime.
    pub fn issue_refresh(&self, sub: Uuid) -> Result<String> {
        self.issue_refresh_with_ttl(sub, self.refresh_ttl)
    }

    /// Issue a refresh token with an explicit lifetime. A non-positive
    /// lifetime produces an already-expired token; useful for expiry
    /// testing.
    pub fn issue_refresh_with_ttl(&self, sub: Uuid, ttl: Duration) -> Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = RefreshClaims {
            sub,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
        };
        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| Error::TokenInvalid(format!("failed to sign refresh token: {e}")))
    }

    /// Issue a fresh access/refresh pair for an identity.
    pub fn issue_pair(&self, sub: Uuid, username: &str, display_name: &str) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access(sub, username, display_name)?,
            refresh_token: self.issue_refresh(sub)?,
        })
    }

    /// Verify an access token: signature integrity plus expiry.
    ///
    /// Fails with [`Error::TokenExpired`] for a well-formed token past
    /// its expiry and [`Error::TokenInvalid`] for anything malformed or
    /// signed with the wrong key. Callers must keep the distinction:
    /// expired prompts a refresh, invalid forces re-login.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        decode::<AccessClaims>(token, &self.access_decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(map_verify_error)
    }

    /// Verify a refresh token; same error contract as [`Self::verify_access`].
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(map_verify_error)
    }
}

/// HS256 validation with zero leeway so expiry is exact.
fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

fn map_verify_error(err: jsonwebtoken::errors::Error) -> Error {
    match err.kind() {
        ErrorKind::ExpiredSignature => Error::TokenExpired,
        _ => Error::TokenInvalid(err.to_string()),
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
