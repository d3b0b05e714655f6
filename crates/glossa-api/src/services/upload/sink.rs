//! Where slot patches are persisted

use async_trait::async_trait;
use glossa_core::models::{SlotName, SlotPatch};
use glossa_core::AppError;
use glossa_db::{MediaDocumentRepository, VideoUploadRepository};
use std::sync::Arc;
use uuid::Uuid;

/// Persists one slot patch of the entity an upload run belongs to
#[async_trait]
pub trait SlotSink: Send + Sync {
    async fn apply(&self, slot: SlotName, patch: SlotPatch) -> Result<(), AppError>;
}

/// Slots of one language config of a topic or vocabulary document
pub struct DocumentSlots {
    pub repo: Arc<dyn MediaDocumentRepository>,
    pub id: Uuid,
    pub language_id: i32,
}

#[async_trait]
impl SlotSink for DocumentSlots {
    async fn apply(&self, slot: SlotName, patch: SlotPatch) -> Result<(), AppError> {
        self.repo
            .apply_slot_update(self.id, self.language_id, slot, patch)
            .await
    }
}

/// The single video slot of a standalone video upload
pub struct VideoUploadSlots {
    pub repo: Arc<dyn VideoUploadRepository>,
    pub id: Uuid,
}

#[async_trait]
impl SlotSink for VideoUploadSlots {
    async fn apply(&self, slot: SlotName, patch: SlotPatch) -> Result<(), AppError> {
        if slot != SlotName::Video {
            return Err(AppError::InvalidInput(format!(
                "Video uploads have no '{}' slot",
                slot
            )));
        }
        self.repo.apply_video_update(self.id, patch).await
    }
}
