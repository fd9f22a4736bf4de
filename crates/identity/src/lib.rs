//! Identity store abstraction and implementations for Gatehouse.
//!
//! This crate provides the durable identity record:
//! - `IdentityStore` contract consumed by the session manager and guard
//! - SQLite implementation with embedded migration
//!
//! The identity record is the only durable artifact in the system;
//! there is no separate session table. The persisted refresh token
//! field doubles as the revocation mechanism.

pub mod error;
pub mod models;
pub mod store;

pub use error::{IdentityError, IdentityResult};
pub use models::{IdentityRow, NewIdentity};
pub use store::{IdentityStore, SqliteStore};

use gatehouse_core::config::IdentityConfig;
use std::sync::Arc;

/// Create an identity store from configuration.
pub async fn from_config(config: &IdentityConfig) -> IdentityResult<Arc<dyn IdentityStore>> {
    match config {
        IdentityConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store) as Arc<dyn IdentityStore>)
        }
    }
}
