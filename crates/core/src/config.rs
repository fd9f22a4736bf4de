//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted upload body size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_bytes() -> u64 {
    16 * 1024 * 1024 // 16 MiB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Token signing and lifetime configuration.
///
/// Access and refresh tokens are signed with distinct secrets so that
/// compromise of one kind does not compromise the other. Secrets are
/// injected at construction; nothing reads ambient process state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access tokens.
    pub access_secret: String,
    /// HMAC secret for refresh tokens. Must differ from `access_secret`.
    pub refresh_secret: String,
    /// Access token lifetime in seconds (default: 15 minutes).
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds (default: 10 days).
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
}

fn default_access_ttl_secs() -> u64 {
    900
}

fn default_refresh_ttl_secs() -> u64 {
    864_000
}

/// Upper bound on configured token lifetimes (10 years). Keeps
/// `now + ttl` far away from `OffsetDateTime` range limits.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

impl AuthConfig {
    /// Access token lifetime as a Duration.
    pub fn access_ttl(&self) -> Duration {
        Duration::seconds(self.access_ttl_secs.min(MAX_TTL_SECS) as i64)
    }

    /// Refresh token lifetime as a Duration.
    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_ttl_secs.min(MAX_TTL_SECS) as i64)
    }

    /// Validate signing configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err("auth config requires non-empty signing secrets".to_string());
        }
        if self.access_secret == self.refresh_secret {
            return Err(
                "auth.access_secret and auth.refresh_secret must differ so compromise of \
                 one token kind does not compromise the other"
                    .to_string(),
            );
        }
        if self.access_ttl_secs == 0 || self.refresh_ttl_secs == 0 {
            return Err("auth token lifetimes must be non-zero".to_string());
        }
        if self.access_ttl_secs > MAX_TTL_SECS || self.refresh_ttl_secs > MAX_TTL_SECS {
            return Err(format!(
                "auth token lifetimes must not exceed {MAX_TTL_SECS} seconds"
            ));
        }
        Ok(())
    }

    /// Create a test configuration with dummy secrets.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_ttl_secs: default_access_ttl_secs(),
            refresh_ttl_secs: default_refresh_ttl_secs(),
        }
    }
}

/// Identity store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IdentityConfig {
    /// SQLite database.
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/identities.db"),
        }
    }
}

/// Remote object store backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaBackendConfig {
    /// Local filesystem store (development and tests).
    Filesystem {
        /// Root directory for stored objects.
        path: PathBuf,
        /// Base URL prepended to object keys when building asset URLs.
        #[serde(default = "default_public_base_url")]
        public_base_url: String,
    },
    /// S3-compatible store.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for MinIO, etc.).
        endpoint: Option<String>,
        /// Region.
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// Access key ID. Falls back to the ambient AWS credential chain if not set.
        access_key_id: Option<String>,
        /// Secret access key. Falls back to the ambient AWS credential chain if not set.
        secret_access_key: Option<String>,
        /// Force path-style URLs. Required for MinIO and some S3-compatible services.
        #[serde(default)]
        force_path_style: bool,
    },
}

fn default_public_base_url() -> String {
    "file:///media".to_string()
}

impl Default for MediaBackendConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/media"),
            public_base_url: default_public_base_url(),
        }
    }
}

impl MediaBackendConfig {
    /// Validate backend configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            MediaBackendConfig::S3 {
                access_key_id,
                secret_access_key,
                ..
            } => match (access_key_id.as_ref(), secret_access_key.as_ref()) {
                (Some(_), Some(_)) | (None, None) => Ok(()),
                _ => Err(
                    "s3 config requires both access_key_id and secret_access_key when either is set"
                        .to_string(),
                ),
            },
            MediaBackendConfig::Filesystem { .. } => Ok(()),
        }
    }
}

/// Media upload configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory where ingress payloads are staged before upload.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    /// Remote object store backend.
    #[serde(default)]
    pub backend: MediaBackendConfig,
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("./data/staging")
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            backend: MediaBackendConfig::default(),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Token signing configuration (required).
    pub auth: AuthConfig,
    /// Identity store configuration.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Media upload configuration.
    #[serde(default)]
    pub media: MediaConfig,
}

impl AppConfig {
    /// Validate configuration invariants across all sections.
    pub fn validate(&self) -> Result<(), String> {
        self.auth.validate()?;
        self.media.backend.validate()?;
        Ok(())
    }

    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses filesystem media storage, SQLite
    /// identities, and dummy signing secrets.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::for_testing(),
            identity: IdentityConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_rejects_shared_secret() {
        let config = AuthConfig {
            access_secret: "same".to_string(),
            refresh_secret: "same".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 864_000,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auth_config_rejects_oversized_ttl() {
        let config = AuthConfig {
            access_secret: "a".to_string(),
            refresh_secret: "b".to_string(),
            access_ttl_secs: u64::MAX,
            refresh_ttl_secs: 864_000,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auth_config_defaults_applied() {
        let json = r#"{"access_secret":"a","refresh_secret":"b"}"#;
        let config: AuthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.access_ttl_secs, 900);
        assert_eq!(config.refresh_ttl_secs, 864_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_media_backend_rejects_partial_credentials() {
        let config = MediaBackendConfig::S3 {
            bucket: "bucket".to_string(),
            endpoint: None,
            region: None,
            prefix: None,
            access_key_id: Some("access-key".to_string()),
            secret_access_key: None,
            force_path_style: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_app_config_for_testing_is_valid() {
        assert!(AppConfig::for_testing().validate().is_ok());
    }
}
