use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use glossa_core::models::{DocumentKind, UploadProgress};
use glossa_core::AppError;
use uuid::Uuid;

use crate::auth::IdentityContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::progress::ProgressReporter;
use crate::state::AppState;

/// Progress of the entity's upload job.
///
/// `progress` is -1 when no job is known. A finished job reports 100 once and is
/// then forgotten.
#[utoipa::path(
    get,
    path = "/api/v1/{collection}/{id}/upload-progress",
    tag = "documents",
    params(
        ("collection" = String, Path, description = "`topics` or `vocabularies`"),
        ("id" = Uuid, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Current progress", body = UploadProgress),
        (status = 403, description = "Entity belongs to another organization", body = ErrorResponse),
        (status = 404, description = "Entity not found", body = ErrorResponse),
        (status = 500, description = "Progress store unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(organization_id = %identity.organization_id, kind = %kind, entity_id = %id))]
pub async fn get_upload_progress(
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

    let progress = ProgressReporter::new(state.upload.progress.clone())
        .report(id)
        .await?;

    Ok(Json(progress))
}
