//! Credential hashing and verification.
//!
//! One-way Argon2id hashing with a random salt. The work factor comes
//! from `Argon2::default()`, which tracks the upstream recommended
//! parameters and is deliberately expensive.

use crate::error::{Error, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a secret into a PHC-format string.
///
/// Fails only on an underlying primitive failure, which is treated as
/// fatal by callers. The output never equals the plaintext.
pub fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Hashing(format!("secret hashing failed: {e}")))
}

/// Verify a secret against a stored PHC hash.
///
/// A mismatch returns `Ok(false)`, never an error; only a malformed
/// stored hash is an error.
pub fn verify_secret(secret: &str, hashed: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hashed)
        .map_err(|e| Error::Hashing(format!("stored hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}
