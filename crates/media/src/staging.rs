//! Local staging of ingress payloads.
//!
//! The ingress layer writes an incoming binary body to a unique file in
//! the staging directory before the upload orchestrator runs. A staged
//! file is transient: it is removed exactly once, on every exit path of
//! the operation that created it.

use crate::error::MediaResult;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// A directory holding transient staged files.
#[derive(Clone, Debug)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Create a staging area, ensuring the directory exists.
    pub async fn new(dir: impl AsRef<Path>) -> MediaResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Write a payload to a uniquely named staged file and return its path.
    pub async fn stage_bytes(&self, data: &[u8], extension: &str) -> MediaResult<PathBuf> {
        let filename = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), extension.trim_start_matches('.'))
        };
        let path = self.dir.join(filename);
        fs::write(&path, data).await?;
        Ok(path)
    }

    /// The staging directory path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
