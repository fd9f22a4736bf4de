//! Media store trait definitions.

use crate::error::MediaResult;
use async_trait::async_trait;
use std::path::Path;

/// A remote object created by a successful upload.
///
/// The identity record is the sole referrer; an asset nothing refers
/// to is orphaned and must be deleted within the same logical
/// operation that stopped referencing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredAsset {
    /// Store-assigned public identifier, used for later deletion.
    pub public_id: String,
    /// Retrievable URL for the asset.
    pub url: String,
}

/// Remote object store abstraction: an opaque upload/delete capability.
#[async_trait]
pub trait MediaStore: Send + Sync + 'static {
    /// Upload a local file's bytes, returning the stored asset.
    async fn upload(&self, path: &Path) -> MediaResult<StoredAsset>;

    /// Delete an object by its public id.
    async fn delete(&self, public_id: &str) -> MediaResult<()>;

    /// Get the name of this storage backend, for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify backend connectivity.
    ///
    /// The default implementation returns Ok(()), suitable for backends
    /// that don't require connectivity verification.
    async fn health_check(&self) -> MediaResult<()> {
        Ok(())
    }
}
