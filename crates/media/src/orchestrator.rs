//! Transactional upload orchestration.
//!
//! `Uploader` moves a staged local file into the remote store and
//! guarantees the staged copy is gone afterward, whatever happened.
//! `UploadTransaction` extends that to multi-step operations: every
//! asset uploaded inside one logical operation is recorded, and if a
//! later step fails the caller rolls back with compensating deletes so
//! no record ends up referencing an asset that was never committed.

use crate::error::{MediaError, MediaResult};
use crate::traits::{MediaStore, StoredAsset};
use std::path::Path;
use std::sync::Arc;

/// Stages local files into the remote store with unconditional local cleanup.
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn MediaStore>,
}

impl Uploader {
    /// Create an uploader over a media store.
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }

    /// The underlying media store.
    pub fn store(&self) -> &Arc<dyn MediaStore> {
        &self.store
    }

    /// Upload a staged local file to the remote store.
    ///
    /// An absent path is a no-op returning `Ok(None)`; the caller
    /// decides whether that is an error. On both upload success and
    /// failure the local staged file is removed; a removal failure only
    /// wastes disk, so it is logged and never escalated. Upload failure
    /// surfaces as [`MediaError::UploadFailed`].
    pub async fn stage_and_upload(
        &self,
        local_path: Option<&Path>,
    ) -> MediaResult<Option<StoredAsset>> {
        let Some(path) = local_path else {
            return Ok(None);
        };

        // Cleanup must also run if this future is dropped mid-upload
        // (client disconnect, caller-side timeout). The guard covers
        // that path; it is disarmed once the explicit removal ran.
        let mut guard = StagedFileGuard { path: Some(path) };
        let result = self.store.upload(path).await;
        remove_staged(path).await;
        guard.disarm();

        match result {
            Ok(asset) => {
                tracing::info!(
                    backend = self.store.backend_name(),
                    public_id = %asset.public_id,
                    url = %asset.url,
                    "uploaded staged file"
                );
                Ok(Some(asset))
            }
            Err(e) => {
                tracing::warn!(
                    backend = self.store.backend_name(),
                    path = %path.display(),
                    error = %e,
                    "upload of staged file failed"
                );
                Err(MediaError::UploadFailed(e.to_string()))
            }
        }
    }

    /// Best-effort compensating delete of a remote asset.
    ///
    /// A failure is logged and swallowed: an orphaned remote asset is
    /// an accepted, monitorable failure mode, and escalating here would
    /// mask the error that triggered the compensation.
    pub async fn delete_asset(&self, public_id: &str) {
        if let Err(e) = self.store.delete(public_id).await {
            tracing::warn!(
                backend = self.store.backend_name(),
                public_id = %public_id,
                error = %e,
                "compensating delete failed, asset orphaned"
            );
        }
    }

    /// Begin a transaction for an operation that chains uploads with a
    /// record write.
    pub fn begin(&self) -> UploadTransaction {
        UploadTransaction {
            uploader: self.clone(),
            uploaded: Vec::new(),
        }
    }
}

/// Records assets uploaded within one logical operation so they can be
/// compensated if a later step fails.
pub struct UploadTransaction {
    uploader: Uploader,
    uploaded: Vec<String>,
}

impl UploadTransaction {
    /// Upload a staged file, recording the asset for potential rollback.
    pub async fn upload(&mut self, local_path: Option<&Path>) -> MediaResult<Option<StoredAsset>> {
        let asset = self.uploader.stage_and_upload(local_path).await?;
        if let Some(asset) = &asset {
            self.uploaded.push(asset.public_id.clone());
        }
        Ok(asset)
    }

    /// The owning record write succeeded; the uploaded assets are now
    /// referenced and must not be deleted.
    pub fn commit(mut self) {
        self.uploaded.clear();
    }

    /// A step after an upload failed: delete every uploaded asset, most
    /// recent first. Never fails, never masks the original error.
    pub async fn rollback(self) {
        for public_id in self.uploaded.iter().rev() {
            tracing::info!(public_id = %public_id, "rolling back uploaded asset");
            self.uploader.delete_asset(public_id).await;
        }
    }
}

/// Removes the staged file on drop unless disarmed. Catches the exit
/// path where the upload future itself is dropped before completion.
struct StagedFileGuard<'a> {
    path: Option<&'a Path>,
}

impl StagedFileGuard<'_> {
    fn disarm(&mut self) {
        self.path = None;
    }
}

impl Drop for StagedFileGuard<'_> {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to remove staged file after aborted upload"
                    );
                }
            }
        }
    }
}

/// Remove a staged file, tolerating it already being gone.
async fn remove_staged(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove staged file");
        }
    }
}
