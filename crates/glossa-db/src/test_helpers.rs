//! In-memory repository doubles for tests
//!
//! They apply the same document model methods as the PostgreSQL repositories,
//! so slot self-healing and language upserts behave identically.

use async_trait::async_trait;
use chrono::Utc;
use glossa_core::models::{
    DocumentKind, LanguageFields, MediaDocument, MediaSlot, NewMediaDocument, NewVideoUpload,
    SlotName, SlotPatch, VideoUpload,
};
use glossa_core::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::db::{MediaDocumentRepository, VideoUploadRepository};

#[derive(Default)]
struct DocumentState {
    documents: HashMap<Uuid, MediaDocument>,
    slot_updates: Vec<(Uuid, i32, SlotName, SlotPatch)>,
    fail_slot_updates: bool,
}

/// Mock document repository that stores documents in memory
#[derive(Clone)]
pub struct MockDocumentRepository {
    kind: DocumentKind,
    state: Arc<Mutex<DocumentState>>,
}

impl MockDocumentRepository {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            state: Arc::new(Mutex::new(DocumentState::default())),
        }
    }

    /// Insert or replace a stored document as-is, e.g. a legacy six-slot document
    pub fn insert(&self, document: MediaDocument) {
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(document.id, document);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<MediaDocument> {
        self.state.lock().unwrap().documents.get(&id).cloned()
    }

    /// Every slot update applied so far, in order
    pub fn slot_updates(&self) -> Vec<(Uuid, i32, SlotName, SlotPatch)> {
        self.state.lock().unwrap().slot_updates.clone()
    }

    pub fn fail_slot_updates(&self) {
        self.state.lock().unwrap().fail_slot_updates = true;
    }

    fn not_found(&self, id: Uuid) -> AppError {
        AppError::NotFound(format!("{} {} not found", self.kind.label(), id))
    }
}

#[async_trait]
impl MediaDocumentRepository for MockDocumentRepository {
    fn kind(&self) -> DocumentKind {
        self.kind
    }

    async fn create(&self, new: NewMediaDocument) -> Result<MediaDocument, AppError> {
        let now = Utc::now();
        let document = MediaDocument {
            id: new.id.unwrap_or_else(Uuid::new_v4),
            kind: self.kind,
            organization_id: new.organization_id,
            topic_id: new.topic_id,
            is_published: new.is_published,
            language_configs: Vec::new(),
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.lock().unwrap();
        if state.documents.contains_key(&document.id) {
            return Err(AppError::Conflict(format!(
                "{} {} already exists",
                self.kind.label(),
                document.id
            )));
        }
        state.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<MediaDocument>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .documents
            .get(&id)
            .filter(|doc| doc.kind == self.kind)
            .cloned())
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        published: Option<bool>,
    ) -> Result<Vec<MediaDocument>, AppError> {
        let mut documents: Vec<MediaDocument> = self
            .state
            .lock()
            .unwrap()
            .documents
            .values()
            .filter(|doc| doc.kind == self.kind && doc.organization_id == organization_id)
            .filter(|doc| published.map_or(true, |p| doc.is_published == p))
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    async fn set_published(&self, id: Uuid, is_published: bool) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        let document = state
            .documents
            .get_mut(&id)
            .ok_or_else(|| self.not_found(id))?;
        document.is_published = is_published;
        document.updated_at = Utc::now();
        Ok(())
    }

    async fn set_topic(&self, id: Uuid, topic_id: Option<Uuid>) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        let document = state
            .documents
            .get_mut(&id)
            .ok_or_else(|| self.not_found(id))?;
        document.topic_id = topic_id;
        document.updated_at = Utc::now();
        Ok(())
    }

    async fn set_language_config(
        &self,
        id: Uuid,
        language_id: i32,
        fields: LanguageFields,
    ) -> Result<MediaDocument, AppError> {
        let mut state = self.state.lock().unwrap();
        let document = state
            .documents
            .get_mut(&id)
            .ok_or_else(|| self.not_found(id))?;
        document.upsert_language_config(language_id, fields);
        document.updated_at = Utc::now();
        Ok(document.clone())
    }

    async fn apply_slot_update(
        &self,
        id: Uuid,
        language_id: i32,
        slot: SlotName,
        patch: SlotPatch,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_slot_updates {
            return Err(AppError::Internal("injected repository failure".to_string()));
        }
        let not_found = self.not_found(id);
        let document = state.documents.get_mut(&id).ok_or(not_found)?;
        document.apply_slot_patch(language_id, slot, &patch);
        document.updated_at = Utc::now();
        state.slot_updates.push((id, language_id, slot, patch));
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.state.lock().unwrap().documents.remove(&id).is_some())
    }
}

/// Mock video upload repository that stores uploads in memory
#[derive(Clone, Default)]
pub struct MockVideoUploadRepository {
    uploads: Arc<Mutex<HashMap<Uuid, VideoUpload>>>,
}

impl MockVideoUploadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, id: Uuid) -> Option<VideoUpload> {
        self.uploads.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl VideoUploadRepository for MockVideoUploadRepository {
    async fn create(&self, new: NewVideoUpload) -> Result<VideoUpload, AppError> {
        let now = Utc::now();
        let upload = VideoUpload {
            id: new.id.unwrap_or_else(Uuid::new_v4),
            organization_id: new.organization_id,
            title: new.title,
            video: MediaSlot::default(),
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        self.uploads.lock().unwrap().insert(upload.id, upload.clone());
        Ok(upload)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<VideoUpload>, AppError> {
        Ok(self.uploads.lock().unwrap().get(&id).cloned())
    }

    async fn set_title(&self, id: Uuid, title: &str) -> Result<(), AppError> {
        let mut uploads = self.uploads.lock().unwrap();
        let upload = uploads
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video upload {} not found", id)))?;
        upload.title = title.to_string();
        Ok(())
    }

    async fn apply_video_update(&self, id: Uuid, patch: SlotPatch) -> Result<(), AppError> {
        let mut uploads = self.uploads.lock().unwrap();
        let upload = uploads
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video upload {} not found", id)))?;
        patch.apply_to_media(&mut upload.video);
        upload.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.uploads.lock().unwrap().remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::models::{ImageSlotName, LanguageConfig, LEGACY_TOPIC_IMAGE_SLOTS};

    fn new_topic() -> NewMediaDocument {
        NewMediaDocument {
            id: None,
            kind: DocumentKind::Topic,
            organization_id: Uuid::new_v4(),
            topic_id: None,
            is_published: false,
            created_by: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_default_slot_helpers_route_through_apply_slot_update() {
        let repo = MockDocumentRepository::new(DocumentKind::Topic);
        let doc = repo.create(new_topic()).await.unwrap();

        repo.set_image_slot(doc.id, 1, ImageSlotName::Icon, "icon-key", "https://link")
            .await
            .unwrap();
        repo.set_video_slot(doc.id, 1, "video-key", "", "00:00", "00:30")
            .await
            .unwrap();
        repo.delete_video_key_only(doc.id, 1).await.unwrap();

        let stored = repo.snapshot(doc.id).unwrap();
        let config = stored.language_config(1).unwrap();
        assert_eq!(config.images[&ImageSlotName::Icon].key, "icon-key");
        assert_eq!(config.video.key, "");
        assert_eq!(config.video.end_time, "00:30");
        assert_eq!(repo.slot_updates().len(), 3);
    }

    #[tokio::test]
    async fn test_write_to_new_slot_on_legacy_document() {
        let repo = MockDocumentRepository::new(DocumentKind::Topic);
        let mut doc = repo.create(new_topic()).await.unwrap();
        let mut legacy = LanguageConfig::new(1, LanguageFields::default());
        legacy
            .images
            .retain(|name, _| LEGACY_TOPIC_IMAGE_SLOTS.contains(name));
        doc.language_configs.push(legacy);
        repo.insert(doc.clone());

        repo.set_image_slot(doc.id, 1, ImageSlotName::SignLang, "sign-key", "")
            .await
            .unwrap();

        let config = repo.snapshot(doc.id).unwrap().language_configs[0].clone();
        assert_eq!(config.images.len(), 9);
        assert_eq!(config.images[&ImageSlotName::SignLang].key, "sign-key");
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let repo = MockDocumentRepository::new(DocumentKind::Vocabulary);
        let err = repo
            .delete_audio_key_only(Uuid::new_v4(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_kinds_are_isolated() {
        let repo = MockDocumentRepository::new(DocumentKind::Vocabulary);
        let mut topic = repo.create(new_topic()).await.unwrap();
        topic.kind = DocumentKind::Topic;
        repo.insert(topic.clone());

        assert!(repo.get_by_id(topic.id).await.unwrap().is_none());
    }
}
