//! Failure-injecting store wrappers for integration tests.

use async_trait::async_trait;
use gatehouse_identity::{IdentityError, IdentityResult, IdentityRow, IdentityStore, NewIdentity};
use gatehouse_media::{MediaError, MediaResult, MediaStore, StoredAsset};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Delegating identity store whose image-reference writes can be armed
/// to fail, simulating a record write dying after a successful upload.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct FlakyIdentityStore {
    inner: Arc<dyn IdentityStore>,
    pub fail_image_writes: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl FlakyIdentityStore {
    pub fn new(inner: Arc<dyn IdentityStore>, fail_image_writes: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            fail_image_writes,
        }
    }

    fn image_write_allowed(&self) -> IdentityResult<()> {
        if self.fail_image_writes.load(Ordering::SeqCst) {
            Err(IdentityError::Internal(
                "injected record write failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IdentityStore for FlakyIdentityStore {
    async fn create_identity(&self, identity: &NewIdentity) -> IdentityResult<IdentityRow> {
        self.inner.create_identity(identity).await
    }

    async fn find_by_id(&self, identity_id: Uuid) -> IdentityResult<Option<IdentityRow>> {
        self.inner.find_by_id(identity_id).await
    }

    async fn find_by_identifier(&self, identifier: &str) -> IdentityResult<Option<IdentityRow>> {
        self.inner.find_by_identifier(identifier).await
    }

    async fn set_refresh_token(
        &self,
        identity_id: Uuid,
        refresh_token: Option<&str>,
    ) -> IdentityResult<()> {
        self.inner.set_refresh_token(identity_id, refresh_token).await
    }

    async fn update_display_name(
        &self,
        identity_id: Uuid,
        display_name: &str,
    ) -> IdentityResult<IdentityRow> {
        self.inner.update_display_name(identity_id, display_name).await
    }

    async fn set_avatar(
        &self,
        identity_id: Uuid,
        asset: Option<(&str, &str)>,
    ) -> IdentityResult<IdentityRow> {
        self.image_write_allowed()?;
        self.inner.set_avatar(identity_id, asset).await
    }

    async fn set_cover(
        &self,
        identity_id: Uuid,
        asset: Option<(&str, &str)>,
    ) -> IdentityResult<IdentityRow> {
        self.image_write_allowed()?;
        self.inner.set_cover(identity_id, asset).await
    }

    async fn migrate(&self) -> IdentityResult<()> {
        self.inner.migrate().await
    }

    async fn health_check(&self) -> IdentityResult<()> {
        self.inner.health_check().await
    }
}

/// Delegating media store that can be armed to fail uploads and that
/// records every delete it is asked for.
#[allow(dead_code)]
pub struct FlakyMediaStore {
    inner: Arc<dyn MediaStore>,
    pub fail_uploads: Arc<AtomicBool>,
    pub deletes: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FlakyMediaStore {
    pub fn new(
        inner: Arc<dyn MediaStore>,
        fail_uploads: Arc<AtomicBool>,
        deletes: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            inner,
            fail_uploads,
            deletes,
        }
    }
}

#[async_trait]
impl MediaStore for FlakyMediaStore {
    async fn upload(&self, path: &Path) -> MediaResult<StoredAsset> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::Backend("injected upload failure".to_string()));
        }
        self.inner.upload(path).await
    }

    async fn delete(&self, public_id: &str) -> MediaResult<()> {
        self.deletes.lock().unwrap().push(public_id.to_string());
        self.inner.delete(public_id).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn health_check(&self) -> MediaResult<()> {
        self.inner.health_check().await
    }
}
