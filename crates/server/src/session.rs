//! Session lifecycle: login, refresh rotation, and logout.
//!
//! Per identity the state machine is Anonymous -> Authenticated (login
//! persists a fresh refresh token, overwriting any prior one -- the
//! single point where a previous session is invalidated), then either
//! Authenticated -> Authenticated (refresh rotates the token) or
//! Authenticated -> Anonymous (logout, or a refresh mismatch forcing
//! re-login).

use crate::error::{ApiError, ApiResult};
use gatehouse_core::credential;
use gatehouse_core::token::{TokenCodec, TokenPair};
use gatehouse_identity::{IdentityRow, IdentityStore, NewIdentity};
use std::sync::Arc;
use uuid::Uuid;

/// Fields required to register an identity. The secret arrives in
/// plaintext here and leaves only as an Argon2id hash.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub secret: String,
    pub display_name: String,
}

/// Orchestrates credential verification, token issuance, and the
/// persisted refresh-token slot.
#[derive(Clone)]
pub struct SessionService {
    identities: Arc<dyn IdentityStore>,
    codec: Arc<TokenCodec>,
}

impl SessionService {
    pub fn new(identities: Arc<dyn IdentityStore>, codec: Arc<TokenCodec>) -> Self {
        Self { identities, codec }
    }

    /// Register a new identity. Fails `Conflict` on a duplicate
    /// username or email.
    pub async fn register(&self, registration: Registration) -> ApiResult<IdentityRow> {
        let secret_hash = credential::hash_secret(&registration.secret)
            .map_err(|e| ApiError::Internal(format!("secret hashing failed: {e}")))?;

        let row = self
            .identities
            .create_identity(&NewIdentity {
                username: registration.username,
                email: registration.email,
                secret_hash,
                display_name: registration.display_name,
            })
            .await?;

        tracing::info!(identity_id = %row.identity_id, username = %row.username, "identity registered");
        Ok(row)
    }

    /// Authenticate a credential pair and open a session.
    ///
    /// Exactly one persisted write: the fresh refresh token overwrites
    /// whatever was in the slot, which is what invalidates any previous
    /// session for this identity.
    pub async fn login(&self, identifier: &str, secret: &str) -> ApiResult<(IdentityRow, TokenPair)> {
        let identity = self
            .identities
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no identity for '{identifier}'")))?;

        let verified = credential::verify_secret(secret, &identity.secret_hash)
            .map_err(|e| ApiError::Internal(format!("credential verification failed: {e}")))?;
        if !verified {
            tracing::info!(identity_id = %identity.identity_id, "login rejected: bad credential");
            return Err(ApiError::Unauthorized("invalid credentials".to_string()));
        }

        let pair = self.issue_pair(&identity)?;
        self.identities
            .set_refresh_token(identity.identity_id, Some(&pair.refresh_token))
            .await?;

        tracing::info!(identity_id = %identity.identity_id, "session opened");
        Ok((identity, pair))
    }

    /// Rotate a refresh token.
    ///
    /// Expired, malformed, identity-missing, and slot-mismatched tokens
    /// all surface uniformly as `Unauthorized` ("must re-authenticate");
    /// the distinction is logged here, not encoded in the error
    /// taxonomy. On a byte-exact slot match a new pair is issued and
    /// the new refresh token is persisted, making the old one
    /// permanently unusable even though it has not expired.
    pub async fn refresh(&self, incoming: &str) -> ApiResult<(IdentityRow, TokenPair)> {
        let claims = match self.codec.verify_refresh(incoming) {
            Ok(claims) => claims,
            Err(e) if e.is_expired() => {
                tracing::info!("refresh rejected: token expired");
                return Err(must_reauthenticate());
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh rejected: token invalid");
                return Err(must_reauthenticate());
            }
        };

        let identity = match self.identities.find_by_id(claims.sub).await? {
            Some(identity) => identity,
            None => {
                tracing::warn!(identity_id = %claims.sub, "refresh rejected: identity gone");
                return Err(must_reauthenticate());
            }
        };

        // Byte-exact comparison against the single persisted slot. A
        // mismatch means the token was already rotated or replayed;
        // this is the system's only replay defense.
        if identity.refresh_token.as_deref() != Some(incoming) {
            tracing::warn!(
                identity_id = %identity.identity_id,
                "refresh rejected: token does not match persisted slot (rotated or replayed)"
            );
            return Err(must_reauthenticate());
        }

        let pair = self.issue_pair(&identity)?;
        self.identities
            .set_refresh_token(identity.identity_id, Some(&pair.refresh_token))
            .await?;

        tracing::debug!(identity_id = %identity.identity_id, "refresh token rotated");
        Ok((identity, pair))
    }

    /// Close the session by clearing the persisted refresh token.
    /// Idempotent: logging out an already-logged-out identity succeeds.
    pub async fn logout(&self, identity_id: Uuid) -> ApiResult<()> {
        match self.identities.set_refresh_token(identity_id, None).await {
            Ok(()) => {}
            Err(gatehouse_identity::IdentityError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!(identity_id = %identity_id, "session closed");
        Ok(())
    }

    /// Issue a token pair, classifying failure as infrastructure fault
    /// rather than caller misuse.
    fn issue_pair(&self, identity: &IdentityRow) -> ApiResult<TokenPair> {
        self.codec
            .issue_pair(
                identity.identity_id,
                &identity.username,
                &identity.display_name,
            )
            .map_err(|e| ApiError::IssuanceFailed(e.to_string()))
    }
}

fn must_reauthenticate() -> ApiError {
    ApiError::Unauthorized("must re-authenticate".to_string())
}
