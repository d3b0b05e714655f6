pub mod documents;
pub mod upload_progress;
pub mod video_uploads;

use glossa_core::models::UploadWarning;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Result of deleting an entity. Objects that could not be removed are listed as warnings.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub id: Uuid,
    pub warnings: Vec<UploadWarning>,
}
