//! S3-compatible media backend using the AWS SDK.

use crate::error::{MediaError, MediaResult};
use crate::traits::{MediaStore, StoredAsset};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use std::path::Path;
use tracing::instrument;
use uuid::Uuid;

/// S3-compatible object store.
pub struct S3Backend {
    client: Client,
    bucket: String,
    prefix: Option<String>,
    endpoint: String,
    force_path_style: bool,
}

impl std::fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Backend")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl S3Backend {
    /// Create a new S3 backend.
    ///
    /// # Arguments
    /// * `force_path_style` - Use path-style URLs (`endpoint/bucket/key`)
    ///   instead of virtual-hosted style. Required for MinIO and some
    ///   S3-compatible services.
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        bucket: &str,
        endpoint: Option<String>,
        region: Option<String>,
        prefix: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        force_path_style: bool,
    ) -> MediaResult<Self> {
        if access_key_id.is_some() ^ secret_access_key.is_some() {
            return Err(MediaError::Config(
                "s3 config requires both access_key_id and secret_access_key when either is set"
                    .to_string(),
            ));
        }

        let resolved_region = region.unwrap_or_else(|| "us-east-1".to_string());
        let mut s3_config_builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(aws_config::Region::new(resolved_region.clone()));

        // Apply credentials: explicit config or ambient AWS credential chain.
        if let (Some(key_id), Some(secret)) = (access_key_id, secret_access_key) {
            let credentials = aws_sdk_s3::config::Credentials::new(
                key_id,
                secret,
                None, // session token
                None, // expiration
                "gatehouse-config",
            );
            s3_config_builder = s3_config_builder.credentials_provider(credentials);
        } else {
            let chain =
                aws_config::default_provider::credentials::DefaultCredentialsChain::builder()
                    .region(aws_config::Region::new(resolved_region.clone()))
                    .build()
                    .await;
            s3_config_builder = s3_config_builder.credentials_provider(chain);
        }

        // Handle bare host:port endpoints (e.g., "minio:9000") by prepending http://
        let normalized_endpoint = endpoint.as_ref().map(|endpoint_url| {
            let endpoint_lower = endpoint_url.to_lowercase();
            if endpoint_lower.starts_with("http://") || endpoint_lower.starts_with("https://") {
                endpoint_url.clone()
            } else {
                format!("http://{}", endpoint_url)
            }
        });

        if let Some(endpoint_url) = &normalized_endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        if force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = Client::from_conf(s3_config_builder.build());

        let stored_endpoint = match &normalized_endpoint {
            Some(url) => url.clone(),
            None => format!("https://s3.{}.amazonaws.com", resolved_region),
        };

        // Strip trailing slashes to avoid double-slash keys like "prefix//key"
        let normalized_prefix = prefix.map(|p| p.trim_end_matches('/').to_string());

        Ok(Self {
            client,
            bucket: bucket.to_string(),
            prefix: normalized_prefix,
            endpoint: stored_endpoint,
            force_path_style,
        })
    }

    /// Get the full object key for a public id (applies prefix if configured).
    fn full_key(&self, public_id: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, public_id),
            None => public_id.to_string(),
        }
    }

    /// Build the retrievable URL for an object key.
    fn url_for(&self, full_key: &str) -> String {
        if self.force_path_style {
            format!("{}/{}/{}", self.endpoint, self.bucket, full_key)
        } else {
            let host = self
                .endpoint
                .trim_start_matches("https://")
                .trim_start_matches("http://");
            format!("https://{}.{}/{}", self.bucket, host, full_key)
        }
    }
}

/// Map an AWS SDK error, surfacing 404s as NotFound.
fn map_sdk_error<E>(err: aws_sdk_s3::error::SdkError<E>, key: &str) -> MediaError
where
    E: std::error::Error + Send + Sync + 'static,
{
    if let aws_sdk_s3::error::SdkError::ServiceError(ref service_err) = err {
        if service_err.raw().status().as_u16() == 404 {
            return MediaError::NotFound(key.to_string());
        }
    }
    MediaError::Backend(err.to_string())
}

#[async_trait]
impl MediaStore for S3Backend {
    #[instrument(skip(self), fields(backend = "s3"))]
    async fn upload(&self, path: &Path) -> MediaResult<StoredAsset> {
        let data = tokio::fs::read(path).await?;

        let public_id = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let full_key = self.full_key(&public_id);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .body(data.into())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &public_id))?;

        Ok(StoredAsset {
            url: self.url_for(&full_key),
            public_id,
        })
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn delete(&self, public_id: &str) -> MediaResult<()> {
        let full_key = self.full_key(public_id);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, public_id))?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn health_check(&self) -> MediaResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| MediaError::Backend(format!("s3 health check failed: {e}")))?;
        Ok(())
    }
}
