//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use gatehouse_core::config::{
    AppConfig, AuthConfig, IdentityConfig, MediaBackendConfig, MediaConfig, ServerConfig,
};
use gatehouse_identity::{IdentityStore, SqliteStore};
use gatehouse_media::{FilesystemBackend, MediaStore, StagingArea, Uploader};
use gatehouse_server::{create_router, AppState};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub media_root: PathBuf,
    pub staging_dir: PathBuf,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server with temporary stores.
    pub async fn new() -> Self {
        Self::with_stores(|identities| identities, |media| media).await
    }

    /// Create a test server, wrapping the real stores so tests can
    /// inject failures.
    pub async fn with_stores<I, M>(wrap_identities: I, wrap_media: M) -> Self
    where
        I: FnOnce(Arc<dyn IdentityStore>) -> Arc<dyn IdentityStore>,
        M: FnOnce(Arc<dyn MediaStore>) -> Arc<dyn MediaStore>,
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let media_root = temp_dir.path().join("media");
        let media: Arc<dyn MediaStore> = Arc::new(
            FilesystemBackend::new(&media_root, "https://media.test")
                .await
                .expect("Failed to create media backend"),
        );
        let media = wrap_media(media);

        let db_path = temp_dir.path().join("identities.db");
        let identities: Arc<dyn IdentityStore> = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .expect("Failed to create identity store"),
        );
        let identities = wrap_identities(identities);

        let staging_dir = temp_dir.path().join("staging");
        let staging = StagingArea::new(&staging_dir)
            .await
            .expect("Failed to create staging area");

        let config = AppConfig {
            server: ServerConfig::default(),
            auth: AuthConfig::for_testing(),
            identity: IdentityConfig::Sqlite { path: db_path },
            media: MediaConfig {
                staging_dir: staging_dir.clone(),
                backend: MediaBackendConfig::Filesystem {
                    path: media_root.clone(),
                    public_base_url: "https://media.test".to_string(),
                },
            },
        };

        let state = AppState::new(config, identities, Uploader::new(media), staging);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            media_root,
            staging_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Register an identity and log it in, returning (access, refresh).
    pub async fn register_and_login(&self, username: &str, secret: &str) -> (String, String) {
        let (status, _) = json_request(
            &self.router,
            "POST",
            "/v1/session/register",
            Some(serde_json::json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "secret": secret,
                "display_name": username,
            })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = json_request(
            &self.router,
            "POST",
            "/v1/session/login",
            Some(serde_json::json!({ "identifier": username, "secret": secret })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        (
            body["access_token"].as_str().expect("access token").to_string(),
            body["refresh_token"].as_str().expect("refresh token").to_string(),
        )
    }

    /// Count regular files under a directory (non-recursive).
    pub fn file_count(dir: &std::path::Path) -> usize {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .count(),
            Err(_) => 0,
        }
    }
}

/// Helper to make JSON requests.
#[allow(dead_code)]
pub async fn json_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = auth_token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let request = builder.body(body).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Helper to make raw-body requests (image uploads).
#[allow(dead_code)]
pub async fn bytes_request(
    router: &axum::Router,
    method: &str,
    uri: &str,
    body: Vec<u8>,
    content_type: &str,
    auth_token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", content_type);

    if let Some(token) = auth_token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = builder.body(Body::from(body)).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}
