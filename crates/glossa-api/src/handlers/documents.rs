//! Topic and vocabulary endpoints.
//!
//! One set of handlers serves both collections; the router attaches the
//! [`DocumentKind`] of each collection as a request extension.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use glossa_core::models::{DocumentKind, MediaDocument, MediaDocumentView, UploadResponse};
use glossa_core::{AppError, Visibility};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::IdentityContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::DeleteResponse;
use crate::services::media_urls::resolve_urls;
use crate::services::upload::{DocumentUploadService, UploadRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Only entities with this publication flag
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishRequest {
    pub is_published: bool,
}

/// Create or update one language config of a topic or vocabulary entry.
///
/// Multipart fields: `id`, `language_id`, `is_published`, `file_name`, `title`, `note`,
/// `description`, `topic_id` (vocabularies), and per slot `<slot>_file`,
/// `<slot>_link_url`, `is_deleted_<slot>`, plus `video_start`, `video_end`,
/// `audio_start`, `audio_end`.
#[utoipa::path(
    post,
    path = "/api/v1/{collection}/upload",
    tag = "documents",
    params(
        ("collection" = String, Path, description = "`topics` or `vocabularies`")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload applied (or accepted in background mode)", body = UploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Entity not found", body = ErrorResponse),
        (status = 409, description = "Another upload for this entity is in progress", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(
        organization_id = %identity.organization_id,
        user_id = %identity.user_id,
        kind = %kind,
        operation = "upload_document"
    )
)]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DocumentKind>,
    identity: IdentityContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    // Checked before the body is read so a viewer never streams files
    identity.require_write()?;

    let request = UploadRequest::from_multipart(multipart, &state.media).await?;
    let response = DocumentUploadService::new(&state, kind)
        .upload(&identity, request)
        .await?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/{collection}/{id}",
    tag = "documents",
    params(
        ("collection" = String, Path, description = "`topics` or `vocabularies`"),
        ("id" = Uuid, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Entity with resolved media URLs", body = MediaDocumentView),
        (status = 403, description = "Entity belongs to another organization", body = ErrorResponse),
        (status = 404, description = "Entity not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(organization_id = %identity.organization_id, kind = %kind, entity_id = %id)
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DocumentKind>,
    identity: IdentityContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let document = state
        .db
        .documents(kind)
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", kind.label(), id)))?;
    identity.require_organization(document.organization_id)?;

    let urls = resolve_urls(
        state.media.storage.as_ref(),
        document.stored_objects(),
        state.media.signed_url_ttl,
    )
    .await;

    Ok(Json(MediaDocumentView::build(&document, &urls)))
}

#[utoipa::path(
    get,
    path = "/api/v1/{collection}",
    tag = "documents",
    params(
        ("collection" = String, Path, description = "`topics` or `vocabularies`"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Entities of the caller's organization, newest first", body = Vec<MediaDocumentView>)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(organization_id = %identity.organization_id, kind = %kind))]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DocumentKind>,
    identity: IdentityContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let documents = state
        .db
        .documents(kind)
        .list_by_organization(identity.organization_id, query.published)
        .await?;

    let objects: Vec<(String, Visibility)> = documents
        .iter()
        .flat_map(MediaDocument::stored_objects)
        .collect();
    let urls = resolve_urls(
        state.media.storage.as_ref(),
        objects,
        state.media.signed_url_ttl,
    )
    .await;

    let views: Vec<MediaDocumentView> = documents
        .iter()
        .map(|document| MediaDocumentView::build(document, &urls))
        .collect();

    Ok(Json(views))
}

#[utoipa::path(
    patch,
    path = "/api/v1/{collection}/{id}/publish",
    tag = "documents",
    params(
        ("collection" = String, Path, description = "`topics` or `vocabularies`"),
        ("id" = Uuid, Path, description = "Entity ID")
    ),
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Publication flag updated", body = MediaDocumentView),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Entity not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, body), fields(organization_id = %identity.organization_id, kind = %kind, entity_id = %id))]
pub async fn publish_document(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DocumentKind>,
    identity: IdentityContext,
    Path(id): Path<Uuid>,
    Json(body): Json<PublishRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    identity.require_write()?;
    let repo = state.db.documents(kind);
    let mut document = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", kind.label(), id)))?;
    identity.require_organization(document.organization_id)?;

    repo.set_published(id, body.is_published).await?;
    document.is_published = body.is_published;
    tracing::info!(is_published = body.is_published, "Publication flag updated");

    let urls = resolve_urls(
        state.media.storage.as_ref(),
        document.stored_objects(),
        state.media.signed_url_ttl,
    )
    .await;

    Ok(Json(MediaDocumentView::build(&document, &urls)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/{collection}/{id}",
    tag = "documents",
    params(
        ("collection" = String, Path, description = "`topics` or `vocabularies`"),
        ("id" = Uuid, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Entity deleted", body = DeleteResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Entity not found", body = ErrorResponse),
        (status = 409, description = "An upload for this entity is in progress", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(organization_id = %identity.organization_id, kind = %kind, entity_id = %id))]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DocumentKind>,
    identity: IdentityContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let warnings = DocumentUploadService::new(&state, kind)
        .delete(&identity, id)
        .await?;

    Ok(Json(DeleteResponse { id, warnings }))
}
