//! Local filesystem media backend.
//!
//! Stands in for a remote object store in development and tests.
//! Objects are keyed by a store-assigned uuid plus the original file
//! extension, so keys never depend on caller-controlled names.

use crate::error::{MediaError, MediaResult};
use crate::traits::{MediaStore, StoredAsset};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;
use uuid::Uuid;

/// Local filesystem object store.
pub struct FilesystemBackend {
    root: PathBuf,
    public_base_url: String,
}

impl FilesystemBackend {
    /// Create a new filesystem backend rooted at `root`.
    pub async fn new(root: impl AsRef<Path>, public_base_url: &str) -> MediaResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a public id to a path under the root, rejecting traversal.
    fn key_path(&self, public_id: &str) -> MediaResult<PathBuf> {
        if public_id.is_empty() || public_id.contains("..") || public_id.contains('/') {
            return Err(MediaError::InvalidKey(format!(
                "unsafe public id: {public_id}"
            )));
        }
        Ok(self.root.join(public_id))
    }
}

#[async_trait]
impl MediaStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn upload(&self, path: &Path) -> MediaResult<StoredAsset> {
        let data = fs::read(path).await?;

        let public_id = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let target = self.key_path(&public_id)?;
        fs::write(&target, data).await?;

        Ok(StoredAsset {
            url: format!("{}/{}", self.public_base_url, public_id),
            public_id,
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, public_id: &str) -> MediaResult<()> {
        let target = self.key_path(public_id)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MediaError::NotFound(public_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    async fn health_check(&self) -> MediaResult<()> {
        fs::metadata(&self.root).await?;
        Ok(())
    }
}
