//! Standalone video upload endpoints

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use glossa_core::models::{UploadResponse, VideoUploadView};
use glossa_core::AppError;
use uuid::Uuid;

use crate::auth::IdentityContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::DeleteResponse;
use crate::services::media_urls::resolve_urls;
use crate::services::upload::{VideoUploadRequest, VideoUploadService};
use crate::state::AppState;

/// Create or update a standalone video.
///
/// Multipart fields: `id`, `title` (required on create), `file`, `link_url`, `start`,
/// `end`, `is_deleted`.
#[utoipa::path(
    post,
    path = "/api/v1/video-uploads",
    tag = "video-uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video stored", body = UploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 409, description = "Another upload for this video is in progress", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(
        organization_id = %identity.organization_id,
        user_id = %identity.user_id,
        operation = "upload_video"
    )
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    identity: IdentityContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    identity.require_write()?;

    let request = VideoUploadRequest::from_multipart(multipart, &state.media).await?;
    let response = VideoUploadService::new(&state)
        .upload(&identity, request)
        .await?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/video-uploads/{id}",
    tag = "video-uploads",
    params(
        ("id" = Uuid, Path, description = "Video upload ID")
    ),
    responses(
        (status = 200, description = "Video with resolved URL", body = VideoUploadView),
        (status = 403, description = "Video belongs to another organization", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(organization_id = %identity.organization_id, video_upload_id = %id))]
pub async fn get_video_upload(
    State(state): State<Arc<AppState>>,
    identity: IdentityContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = state
        .db
        .video_uploads
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video upload {} not found", id)))?;
    identity.require_organization(upload.organization_id)?;

    let urls = resolve_urls(
        state.media.storage.as_ref(),
        vec![(upload.video.key.clone(), upload.video.visibility)],
        state.media.signed_url_ttl,
    )
    .await;

    Ok(Json(VideoUploadView::build(&upload, &urls)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/video-uploads/{id}",
    tag = "video-uploads",
    params(
        ("id" = Uuid, Path, description = "Video upload ID")
    ),
    responses(
        (status = 200, description = "Video deleted", body = DeleteResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(organization_id = %identity.organization_id, video_upload_id = %id))]
pub async fn delete_video_upload(
    State(state): State<Arc<AppState>>,
    identity: IdentityContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let warnings = VideoUploadService::new(&state)
        .delete(&identity, id)
        .await?;

    Ok(Json(DeleteResponse { id, warnings }))
}
