//! Database models mapping to the identity schema.

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Durable identity record.
///
/// `secret_hash` and `refresh_token` exist only inside the store layer
/// and the session manager; they are stripped before any record leaves
/// the API boundary. At most one refresh token is live per identity at
/// any time -- overwriting it is the entire revocation mechanism.
#[derive(Debug, Clone, FromRow)]
pub struct IdentityRow {
    pub identity_id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2id PHC hash, never the plaintext.
    pub secret_hash: String,
    /// Currently-live refresh token, if a session exists.
    pub refresh_token: Option<String>,
    pub display_name: String,
    /// Store-assigned public id of the avatar asset.
    pub avatar_id: Option<String>,
    pub avatar_url: Option<String>,
    /// Store-assigned public id of the cover asset.
    pub cover_id: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields required to create an identity.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    /// Already hashed by the caller; the store never sees a plaintext secret.
    pub secret_hash: String,
    pub display_name: String,
}
