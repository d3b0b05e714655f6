use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::document::MediaSlotView;
use super::slot::MediaSlot;

/// Standalone uploaded video with its playback markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoUpload {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub video: MediaSlot,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a video upload
#[derive(Debug, Clone)]
pub struct NewVideoUpload {
    /// Generated when absent
    pub id: Option<Uuid>,
    pub organization_id: Uuid,
    pub title: String,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoUploadView {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub video: MediaSlotView,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoUploadView {
    pub fn build(upload: &VideoUpload, urls: &HashMap<String, String>) -> Self {
        VideoUploadView {
            id: upload.id,
            organization_id: upload.organization_id,
            title: upload.title.clone(),
            video: MediaSlotView::build(&upload.video, urls),
            created_by: upload.created_by,
            created_at: upload.created_at,
            updated_at: upload.updated_at,
        }
    }
}
