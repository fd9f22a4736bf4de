//! Media storage abstraction and upload orchestration for Gatehouse.
//!
//! This crate provides:
//! - The remote object store contract (upload/delete by public id)
//! - Backends: local filesystem and S3-compatible
//! - Staging of ingress payloads with guaranteed cleanup
//! - The transactional upload orchestrator with compensating rollback

pub mod backends;
pub mod error;
pub mod orchestrator;
pub mod staging;
pub mod traits;

pub use backends::{filesystem::FilesystemBackend, s3::S3Backend};
pub use error::{MediaError, MediaResult};
pub use orchestrator::{UploadTransaction, Uploader};
pub use staging::StagingArea;
pub use traits::{MediaStore, StoredAsset};

use gatehouse_core::config::MediaBackendConfig;
use std::sync::Arc;

/// Create a media store from configuration.
pub async fn from_config(config: &MediaBackendConfig) -> MediaResult<Arc<dyn MediaStore>> {
    config.validate().map_err(MediaError::Config)?;

    match config {
        MediaBackendConfig::Filesystem {
            path,
            public_base_url,
        } => {
            let backend = FilesystemBackend::new(path, public_base_url).await?;
            Ok(Arc::new(backend))
        }
        MediaBackendConfig::S3 {
            bucket,
            endpoint,
            region,
            prefix,
            access_key_id,
            secret_access_key,
            force_path_style,
        } => {
            let backend = S3Backend::new(
                bucket,
                endpoint.clone(),
                region.clone(),
                prefix.clone(),
                access_key_id.clone(),
                secret_access_key.clone(),
                *force_path_style,
            )
            .await?;
            Ok(Arc::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_filesystem() {
        let temp = tempfile::tempdir().unwrap();
        let config = MediaBackendConfig::Filesystem {
            path: temp.path().join("media"),
            public_base_url: "https://media.test".to_string(),
        };

        let store = from_config(&config).await.unwrap();
        assert_eq!(store.backend_name(), "filesystem");
    }

    #[tokio::test]
    async fn test_from_config_rejects_partial_credentials() {
        let config = MediaBackendConfig::S3 {
            bucket: "bucket".to_string(),
            endpoint: None,
            region: None,
            prefix: None,
            access_key_id: Some("access".to_string()),
            secret_access_key: None,
            force_path_style: false,
        };

        match from_config(&config).await {
            Err(MediaError::Config(_)) => {}
            other => panic!("expected Config error, got {:?}", other.map(|s| s.backend_name())),
        }
    }
}
