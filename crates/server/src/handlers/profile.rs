//! Identity profile endpoints, including transactional image uploads.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentIdentity;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use gatehouse_identity::IdentityRow;
use gatehouse_media::StoredAsset;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: String,
}

/// GET /v1/identity/me
pub async fn me(identity: CurrentIdentity) -> Json<CurrentIdentity> {
    Json(identity)
}

/// PATCH /v1/identity/profile
pub async fn update_profile(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<CurrentIdentity>> {
    let display_name = req.display_name.trim();
    if display_name.is_empty() {
        return Err(ApiError::Validation(
            "display_name must be non-empty".to_string(),
        ));
    }

    let row = state
        .identities
        .update_display_name(identity.identity_id, display_name)
        .await?;

    Ok(Json(CurrentIdentity::from(&row)))
}

/// PUT /v1/identity/avatar
pub async fn upload_avatar(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<CurrentIdentity>> {
    replace_image(&state, identity.identity_id, &headers, body, ImageSlot::Avatar).await
}

/// PUT /v1/identity/cover
pub async fn upload_cover(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<CurrentIdentity>> {
    replace_image(&state, identity.identity_id, &headers, body, ImageSlot::Cover).await
}

/// Which image reference on the identity record is being replaced.
#[derive(Clone, Copy, Debug)]
enum ImageSlot {
    Avatar,
    Cover,
}

impl ImageSlot {
    fn previous_id(self, row: &IdentityRow) -> Option<String> {
        match self {
            Self::Avatar => row.avatar_id.clone(),
            Self::Cover => row.cover_id.clone(),
        }
    }

    async fn apply(
        self,
        state: &AppState,
        identity_id: Uuid,
        asset: &StoredAsset,
    ) -> ApiResult<IdentityRow> {
        let reference = Some((asset.public_id.as_str(), asset.url.as_str()));
        let row = match self {
            Self::Avatar => state.identities.set_avatar(identity_id, reference).await?,
            Self::Cover => state.identities.set_cover(identity_id, reference).await?,
        };
        Ok(row)
    }
}

/// Replace one image reference on the identity record.
///
/// The upload and the record write form one logical operation: the
/// payload is staged locally, pushed to the media store inside a
/// transaction, and the record write decides its fate. If the write
/// fails the transaction rolls back with a compensating delete so the
/// record never points at, nor silently leaks, an uncommitted asset.
/// The previously referenced asset is deleted only after commit.
async fn replace_image(
    state: &AppState,
    identity_id: Uuid,
    headers: &HeaderMap,
    body: Bytes,
    slot: ImageSlot,
) -> ApiResult<Json<CurrentIdentity>> {
    if body.is_empty() {
        return Err(ApiError::Validation("image payload is empty".to_string()));
    }

    let row = state
        .identities
        .find_by_id(identity_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("identity no longer exists".to_string()))?;
    let previous = slot.previous_id(&row);

    let extension = extension_for(headers);
    let staged = state.staging.stage_bytes(&body, extension).await?;

    let mut tx = state.uploader.begin();
    let asset = tx
        .upload(Some(staged.as_path()))
        .await?
        .ok_or_else(|| ApiError::Internal("upload produced no asset".to_string()))?;

    let updated = match slot.apply(state, identity_id, &asset).await {
        Ok(row) => {
            tx.commit();
            row
        }
        Err(e) => {
            tracing::warn!(
                identity_id = %identity_id,
                slot = ?slot,
                error = %e,
                "record write failed after upload, compensating"
            );
            tx.rollback().await;
            return Err(e);
        }
    };

    // Superseded asset: best effort, the new reference is already live.
    if let Some(old) = previous {
        state.uploader.delete_asset(&old).await;
    }

    Ok(Json(CurrentIdentity::from(&updated)))
}

/// Map the request content type to a staging file extension.
fn extension_for(headers: &HeaderMap) -> &'static str {
    match headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        Some("image/png") => "png",
        Some("image/jpeg") => "jpg",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        _ => "bin",
    }
}
