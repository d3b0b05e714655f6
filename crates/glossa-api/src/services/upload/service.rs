//! Upload orchestration for topics, vocabularies and standalone videos.
//!
//! An upload persists the entity and its language text first, then applies the
//! planned slot actions through [`UploadRunner`]. A per-entity lease in the progress
//! store keeps two uploads from interleaving on the same entity.

use glossa_core::models::{
    DocumentKind, MediaDocument, NewMediaDocument, NewVideoUpload, UploadResponse, UploadWarning,
    VideoUpload,
};
use glossa_core::{AppError, UploadMode};
use glossa_db::{MediaDocumentRepository, VideoUploadRepository};
use glossa_infra::{LeaseToken, ProgressStore};
use glossa_storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::plan::{plan_slot, plan_slots, PlannedSlot};
use super::request::{UploadRequest, VideoUploadRequest};
use super::runner::{RunOutcome, UploadRunner};
use super::sink::{DocumentSlots, VideoUploadSlots};
use crate::auth::IdentityContext;
use crate::state::AppState;

/// Storage folder of standalone video uploads
pub const VIDEO_UPLOAD_COLLECTION: &str = "video-uploads";

/// Upload and deletion of topic or vocabulary documents
#[derive(Clone)]
pub struct DocumentUploadService {
    kind: DocumentKind,
    repo: Arc<dyn MediaDocumentRepository>,
    topics: Arc<dyn MediaDocumentRepository>,
    storage: Arc<dyn Storage>,
    progress: Arc<dyn ProgressStore>,
    mode: UploadMode,
    lease_ttl: Duration,
}

impl DocumentUploadService {
    pub fn new(state: &AppState, kind: DocumentKind) -> Self {
        Self {
            kind,
            repo: state.db.documents(kind),
            topics: state.db.topics.clone(),
            storage: state.media.storage.clone(),
            progress: state.upload.progress.clone(),
            mode: state.upload.mode,
            lease_ttl: state.upload.lease_ttl,
        }
    }

    /// Create or update one language config of a document and apply its slot changes.
    ///
    /// In inline mode the first slot failure is returned as the error; slots applied
    /// before it stay committed.
    #[tracing::instrument(skip(self, identity, request), fields(kind = %self.kind, user_id = %identity.user_id))]
    pub async fn upload(
        &self,
        identity: &IdentityContext,
        request: UploadRequest,
    ) -> Result<UploadResponse, AppError> {
        identity.require_write()?;

        let existing = match request.id {
            Some(id) => Some(self.load_owned(identity, id).await?),
            None => None,
        };
        let id = existing
            .as_ref()
            .map(|document| document.id)
            .unwrap_or_else(Uuid::new_v4);

        let lease = acquire_lease(self.progress.as_ref(), self.kind.label(), id, self.lease_ttl).await?;

        let prepared = match self.prepare(identity, id, existing, &request).await {
            Ok(prepared) => prepared,
            Err(error) => {
                release_lease(self.progress.as_ref(), id, &lease).await;
                return Err(error);
            }
        };

        let title = slug_source(&request, self.kind);
        let file_count = prepared.iter().filter(|p| p.is_tracked()).count() as i64;
        let tracked = file_count > 0 && self.start_job(id, file_count, &request).await;

        let runner = Arc::new(UploadRunner {
            entity_id: id,
            collection: self.kind.collection(),
            title,
            visibility: request.visibility,
            storage: self.storage.clone(),
            sink: Arc::new(DocumentSlots {
                repo: self.repo.clone(),
                id,
                language_id: request.language_id,
            }),
            progress: tracked.then(|| self.progress.clone()),
        });

        if self.mode == UploadMode::Background && file_count > 0 {
            let progress = self.progress.clone();
            tokio::spawn(async move {
                let outcome = runner.run(prepared).await;
                log_outcome(id, &outcome);
                release_lease(progress.as_ref(), id, &lease).await;
            });
            return Ok(UploadResponse {
                id,
                warnings: Vec::new(),
                progress_pending: tracked,
            });
        }

        let outcome = runner.run(prepared).await;
        release_lease(self.progress.as_ref(), id, &lease).await;
        log_outcome(id, &outcome);

        match outcome.failure {
            Some(error) => Err(error),
            None => Ok(UploadResponse {
                id,
                warnings: outcome.warnings,
                progress_pending: false,
            }),
        }
    }

    /// Persist the entity and its language text, then plan the slot actions against
    /// what is stored.
    async fn prepare(
        &self,
        identity: &IdentityContext,
        id: Uuid,
        existing: Option<MediaDocument>,
        request: &UploadRequest,
    ) -> Result<Vec<PlannedSlot>, AppError> {
        self.check_topic(identity, request.topic_id).await?;

        match existing {
            None => {
                self.repo
                    .create(NewMediaDocument {
                        id: Some(id),
                        kind: self.kind,
                        organization_id: identity.organization_id,
                        topic_id: request.topic_id,
                        is_published: request.is_published.unwrap_or(false),
                        created_by: identity.user_id,
                    })
                    .await?;
                tracing::info!(entity_id = %id, "Document created");
            }
            Some(document) => {
                if let Some(is_published) = request.is_published {
                    if is_published != document.is_published {
                        self.repo.set_published(id, is_published).await?;
                    }
                }
                if request.topic_id.is_some() && request.topic_id != document.topic_id {
                    self.repo.set_topic(id, request.topic_id).await?;
                }
            }
        }

        let document = self
            .repo
            .set_language_config(id, request.language_id, request.fields.clone())
            .await?;

        Ok(plan_slots(
            &request.slots,
            document.language_config(request.language_id),
        ))
    }

    async fn check_topic(
        &self,
        identity: &IdentityContext,
        topic_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let Some(topic_id) = topic_id else {
            return Ok(());
        };
        if self.kind != DocumentKind::Vocabulary {
            return Err(AppError::InvalidInput(
                "topic_id is only accepted for vocabulary entries".to_string(),
            ));
        }
        match self.topics.get_by_id(topic_id).await? {
            Some(topic) if topic.organization_id == identity.organization_id => Ok(()),
            _ => Err(AppError::InvalidInput(format!(
                "Topic {} does not exist",
                topic_id
            ))),
        }
    }

    /// Start progress tracking. Tracking is advisory: if the store refuses, the upload
    /// proceeds untracked.
    async fn start_job(&self, id: Uuid, file_count: i64, request: &UploadRequest) -> bool {
        let file_name = if request.fields.file_name.is_empty() {
            request.fields.title.as_str()
        } else {
            request.fields.file_name.as_str()
        };
        match self.progress.init_job(id, file_count, file_name).await {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(entity_id = %id, error = %error, "Failed to start upload progress job");
                false
            }
        }
    }

    async fn load_owned(
        &self,
        identity: &IdentityContext,
        id: Uuid,
    ) -> Result<MediaDocument, AppError> {
        let document = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", self.kind.label(), id)))?;
        identity.require_organization(document.organization_id)?;
        Ok(document)
    }

    /// Delete a document and, best effort, every object it references.
    #[tracing::instrument(skip(self, identity), fields(kind = %self.kind))]
    pub async fn delete(
        &self,
        identity: &IdentityContext,
        id: Uuid,
    ) -> Result<Vec<UploadWarning>, AppError> {
        identity.require_write()?;
        let document = self.load_owned(identity, id).await?;

        let lease = acquire_lease(self.progress.as_ref(), self.kind.label(), id, self.lease_ttl).await?;
        let deleted = self.repo.delete(id).await;
        release_lease(self.progress.as_ref(), id, &lease).await;

        if !deleted? {
            return Err(AppError::NotFound(format!(
                "{} {} not found",
                self.kind.label(),
                id
            )));
        }
        tracing::info!(entity_id = %id, "Document deleted");

        Ok(delete_objects(self.storage.as_ref(), document.stored_keys()).await)
    }
}

/// Upload and deletion of standalone videos.
///
/// Videos are always applied inline and are not progress-tracked.
#[derive(Clone)]
pub struct VideoUploadService {
    repo: Arc<dyn VideoUploadRepository>,
    storage: Arc<dyn Storage>,
    progress: Arc<dyn ProgressStore>,
    lease_ttl: Duration,
}

impl VideoUploadService {
    pub fn new(state: &AppState) -> Self {
        Self {
            repo: state.db.video_uploads.clone(),
            storage: state.media.storage.clone(),
            progress: state.upload.progress.clone(),
            lease_ttl: state.upload.lease_ttl,
        }
    }

    #[tracing::instrument(skip(self, identity, request), fields(user_id = %identity.user_id))]
    pub async fn upload(
        &self,
        identity: &IdentityContext,
        request: VideoUploadRequest,
    ) -> Result<UploadResponse, AppError> {
        identity.require_write()?;

        let existing = match request.id {
            Some(id) => Some(self.load_owned(identity, id).await?),
            None => None,
        };
        let id = existing
            .as_ref()
            .map(|upload| upload.id)
            .unwrap_or_else(Uuid::new_v4);

        let lease = acquire_lease(self.progress.as_ref(), "Video upload", id, self.lease_ttl).await?;
        let prepared = self.prepare(identity, id, existing, &request).await;
        let outcome = match prepared {
            Ok((title, plan)) => {
                let runner = Arc::new(UploadRunner {
                    entity_id: id,
                    collection: VIDEO_UPLOAD_COLLECTION,
                    title,
                    visibility: request.visibility,
                    storage: self.storage.clone(),
                    sink: Arc::new(VideoUploadSlots {
                        repo: self.repo.clone(),
                        id,
                    }),
                    progress: None,
                });
                runner.run(vec![plan]).await
            }
            Err(error) => RunOutcome {
                warnings: Vec::new(),
                failure: Some(error),
            },
        };
        release_lease(self.progress.as_ref(), id, &lease).await;

        match outcome.failure {
            Some(error) => Err(error),
            None => Ok(UploadResponse {
                id,
                warnings: outcome.warnings,
                progress_pending: false,
            }),
        }
    }

    async fn prepare(
        &self,
        identity: &IdentityContext,
        id: Uuid,
        existing: Option<VideoUpload>,
        request: &VideoUploadRequest,
    ) -> Result<(String, PlannedSlot), AppError> {
        let upload = match existing {
            None => {
                let title = request
                    .title
                    .as_deref()
                    .map(str::trim)
                    .filter(|title| !title.is_empty())
                    .ok_or_else(|| AppError::InvalidInput("title is required".to_string()))?;
                self.repo
                    .create(NewVideoUpload {
                        id: Some(id),
                        organization_id: identity.organization_id,
                        title: title.to_string(),
                        created_by: identity.user_id,
                    })
                    .await?
            }
            Some(mut upload) => {
                if let Some(title) = request.title.as_deref().map(str::trim) {
                    if !title.is_empty() && title != upload.title {
                        self.repo.set_title(id, title).await?;
                        upload.title = title.to_string();
                    }
                }
                upload
            }
        };

        Ok((upload.title.clone(), plan_slot(&request.video, &upload.video)))
    }

    async fn load_owned(
        &self,
        identity: &IdentityContext,
        id: Uuid,
    ) -> Result<VideoUpload, AppError> {
        let upload = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video upload {} not found", id)))?;
        identity.require_organization(upload.organization_id)?;
        Ok(upload)
    }

    pub async fn delete(
        &self,
        identity: &IdentityContext,
        id: Uuid,
    ) -> Result<Vec<UploadWarning>, AppError> {
        identity.require_write()?;
        let upload = self.load_owned(identity, id).await?;

        let lease = acquire_lease(self.progress.as_ref(), "Video upload", id, self.lease_ttl).await?;
        let deleted = self.repo.delete(id).await;
        release_lease(self.progress.as_ref(), id, &lease).await;

        if !deleted? {
            return Err(AppError::NotFound(format!("Video upload {} not found", id)));
        }

        let keys = if upload.video.has_key() {
            vec![upload.video.key]
        } else {
            Vec::new()
        };
        Ok(delete_objects(self.storage.as_ref(), keys).await)
    }
}

/// Take the entity's upload lease or fail with `Conflict`
async fn acquire_lease(
    progress: &dyn ProgressStore,
    label: &str,
    id: Uuid,
    ttl: Duration,
) -> Result<LeaseToken, AppError> {
    progress.acquire_lease(id, ttl).await?.ok_or_else(|| {
        AppError::Conflict(format!(
            "An upload for {} {} is already in progress",
            label.to_lowercase(),
            id
        ))
    })
}

async fn release_lease(progress: &dyn ProgressStore, id: Uuid, lease: &LeaseToken) {
    match progress.release_lease(id, lease).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(entity_id = %id, "Upload lease expired before release"),
        Err(error) => tracing::warn!(entity_id = %id, error = %error, "Failed to release upload lease"),
    }
}

async fn delete_objects(storage: &dyn Storage, keys: Vec<String>) -> Vec<UploadWarning> {
    let mut warnings = Vec::new();
    for key in keys {
        if let Err(error) = storage.delete(&key).await {
            tracing::warn!(key = %key, error = %error, "Failed to delete object of removed entity");
            warnings.push(UploadWarning {
                slot: String::new(),
                key,
                message: format!("Object could not be deleted: {}", error),
            });
        }
    }
    warnings
}

fn slug_source(request: &UploadRequest, kind: DocumentKind) -> String {
    [&request.fields.title, &request.fields.file_name]
        .into_iter()
        .find(|text| !text.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| kind.as_str().to_string())
}

fn log_outcome(id: Uuid, outcome: &RunOutcome) {
    match &outcome.failure {
        Some(error) => tracing::warn!(entity_id = %id, error = %error, "Upload finished with a failed slot"),
        None => tracing::info!(
            entity_id = %id,
            warnings = outcome.warnings.len(),
            "Upload finished"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use crate::services::upload::request::SlotRequest;
    use crate::state::DbState;
    use glossa_core::config::{BaseConfig, ServiceConfig};
    use glossa_core::models::{ImageSlotName, LanguageFields, SlotName};
    use glossa_core::{Config, StorageBackend};
    use glossa_db::test_helpers::{MockDocumentRepository, MockVideoUploadRepository};
    use glossa_infra::MemoryProgressStore;
    use glossa_storage::test_helpers::MockStorage;

    const ICON: SlotName = SlotName::Image(ImageSlotName::Icon);

    struct Harness {
        state: AppState,
        topics: MockDocumentRepository,
        vocabularies: MockDocumentRepository,
        videos: MockVideoUploadRepository,
        storage: MockStorage,
        progress: MemoryProgressStore,
    }

    fn test_config(mode: UploadMode) -> Config {
        Config(Box::new(ServiceConfig {
            base: BaseConfig {
                server_port: 0,
                cors_origins: vec!["*".to_string()],
                db_max_connections: 1,
                db_timeout_seconds: 1,
                jwt_secret: "unit-test-secret-unit-test-secret".to_string(),
                environment: "test".to_string(),
                log_format: "text".to_string(),
            },
            database_url: "postgresql://localhost/test".to_string(),
            redis_url: None,
            storage_backend: Some(StorageBackend::Local),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: None,
            local_storage_base_url: None,
            signed_url_ttl_secs: 60,
            upload_mode: mode,
            upload_lease_ttl_secs: 60,
            max_image_size_bytes: 1024,
            max_video_size_bytes: 4096,
            max_audio_size_bytes: 2048,
        }))
    }

    fn harness(mode: UploadMode) -> Harness {
        let topics = MockDocumentRepository::new(DocumentKind::Topic);
        let vocabularies = MockDocumentRepository::new(DocumentKind::Vocabulary);
        let videos = MockVideoUploadRepository::new();
        let storage = MockStorage::new();
        let progress = MemoryProgressStore::new();
        let db = DbState {
            pool: None,
            topics: Arc::new(topics.clone()),
            vocabularies: Arc::new(vocabularies.clone()),
            video_uploads: Arc::new(videos.clone()),
        };
        let state = AppState::new(
            test_config(mode),
            db,
            Arc::new(storage.clone()),
            Arc::new(progress.clone()),
        );
        Harness {
            state,
            topics,
            vocabularies,
            videos,
            storage,
            progress,
        }
    }

    fn editor(organization_id: Uuid) -> IdentityContext {
        IdentityContext {
            user_id: Uuid::new_v4(),
            organization_id,
            app_language_id: 1,
            role: UserRole::Editor,
        }
    }

    fn colors(id: Option<Uuid>) -> UploadRequest {
        UploadRequest::new(
            id,
            1,
            LanguageFields {
                file_name: "colors".to_string(),
                title: "Colors".to_string(),
                ..LanguageFields::default()
            },
        )
    }

    fn with_icon(request: UploadRequest) -> UploadRequest {
        request.with_slot(SlotRequest::new(ICON).with_file("icon.png", "image/png", vec![1u8; 8]))
    }

    #[tokio::test]
    async fn test_create_topic_with_icon() {
        let h = harness(UploadMode::Inline);
        let service = DocumentUploadService::new(&h.state, DocumentKind::Topic);
        let identity = editor(Uuid::new_v4());

        let response = service.upload(&identity, with_icon(colors(None))).await.unwrap();

        let document = h.topics.snapshot(response.id).unwrap();
        assert_eq!(document.organization_id, identity.organization_id);
        let config = document.language_config(1).unwrap();
        assert_eq!(config.title, "Colors");
        assert_eq!(config.images.len(), 9);
        assert!(config.images[&ImageSlotName::Icon]
            .key
            .starts_with("topics/images/colors-icon-"));
        assert!(!response.progress_pending);
        assert_eq!(h.storage.puts().len(), 1);
    }

    #[tokio::test]
    async fn test_update_of_other_organization_is_denied_before_writes() {
        let h = harness(UploadMode::Inline);
        let service = DocumentUploadService::new(&h.state, DocumentKind::Topic);
        let owner = editor(Uuid::new_v4());
        let created = service.upload(&owner, colors(None)).await.unwrap();

        let intruder = editor(Uuid::new_v4());
        let err = service
            .upload(&intruder, with_icon(colors(Some(created.id))))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AccessDenied(_)));
        assert!(h.storage.puts().is_empty());
    }

    #[tokio::test]
    async fn test_viewer_cannot_upload() {
        let h = harness(UploadMode::Inline);
        let service = DocumentUploadService::new(&h.state, DocumentKind::Topic);
        let mut viewer = editor(Uuid::new_v4());
        viewer.role = UserRole::Viewer;

        let err = service.upload(&viewer, colors(None)).await.unwrap_err();
        assert!(matches!(err, AppError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let h = harness(UploadMode::Inline);
        let service = DocumentUploadService::new(&h.state, DocumentKind::Topic);
        let err = service
            .upload(&editor(Uuid::new_v4()), colors(Some(Uuid::new_v4())))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_held_lease_is_conflict() {
        let h = harness(UploadMode::Inline);
        let service = DocumentUploadService::new(&h.state, DocumentKind::Topic);
        let identity = editor(Uuid::new_v4());
        let created = service.upload(&identity, colors(None)).await.unwrap();

        let _held = h
            .progress
            .acquire_lease(created.id, Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();
        let err = service
            .upload(&identity, colors(Some(created.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_lease_released_after_failure() {
        let h = harness(UploadMode::Inline);
        let service = DocumentUploadService::new(&h.state, DocumentKind::Topic);
        let identity = editor(Uuid::new_v4());
        h.storage.fail_puts_matching("-icon-");

        let created = service.upload(&identity, colors(None)).await.unwrap();
        let err = service
            .upload(&identity, with_icon(colors(Some(created.id))))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));

        let lease = h
            .progress
            .acquire_lease(created.id, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(lease.is_some());
    }

    #[tokio::test]
    async fn test_inline_job_reaches_completion() {
        let h = harness(UploadMode::Inline);
        let service = DocumentUploadService::new(&h.state, DocumentKind::Topic);
        let response = service
            .upload(&editor(Uuid::new_v4()), with_icon(colors(None)))
            .await
            .unwrap();

        assert_eq!(h.progress.get_total(response.id).await.unwrap(), 1);
        assert_eq!(h.progress.get_remaining(response.id).await.unwrap(), 0);
        assert_eq!(h.progress.get_file_name(response.id).await.unwrap(), "colors");
    }

    #[tokio::test]
    async fn test_background_mode_reports_pending_progress() {
        let h = harness(UploadMode::Background);
        let service = DocumentUploadService::new(&h.state, DocumentKind::Topic);
        let response = service
            .upload(&editor(Uuid::new_v4()), with_icon(colors(None)))
            .await
            .unwrap();

        assert!(response.progress_pending);
        for _ in 0..100 {
            if h.progress.get_remaining(response.id).await.unwrap() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(h.progress.get_remaining(response.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_vocabulary_links_topic_of_same_organization() {
        let h = harness(UploadMode::Inline);
        let identity = editor(Uuid::new_v4());
        let topic = DocumentUploadService::new(&h.state, DocumentKind::Topic)
            .upload(&identity, colors(None))
            .await
            .unwrap();
        let vocabularies = DocumentUploadService::new(&h.state, DocumentKind::Vocabulary);

        let mut request = colors(None);
        request.topic_id = Some(topic.id);
        let entry = vocabularies.upload(&identity, request).await.unwrap();
        assert_eq!(
            h.vocabularies.snapshot(entry.id).unwrap().topic_id,
            Some(topic.id)
        );

        let mut foreign = colors(None);
        foreign.topic_id = Some(topic.id);
        let err = vocabularies
            .upload(&editor(Uuid::new_v4()), foreign)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_document_and_objects() {
        let h = harness(UploadMode::Inline);
        let service = DocumentUploadService::new(&h.state, DocumentKind::Topic);
        let identity = editor(Uuid::new_v4());
        let response = service.upload(&identity, with_icon(colors(None))).await.unwrap();
        let key = h.topics.snapshot(response.id).unwrap().stored_keys()[0].clone();

        let warnings = service.delete(&identity, response.id).await.unwrap();

        assert!(warnings.is_empty());
        assert!(h.topics.snapshot(response.id).is_none());
        assert_eq!(h.storage.deletes(), vec![key]);
    }

    #[tokio::test]
    async fn test_video_upload_requires_title_on_create() {
        let h = harness(UploadMode::Inline);
        let service = VideoUploadService::new(&h.state);
        let err = service
            .upload(&editor(Uuid::new_v4()), VideoUploadRequest::new(None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_video_upload_stores_video() {
        let h = harness(UploadMode::Inline);
        let service = VideoUploadService::new(&h.state);
        let mut request = VideoUploadRequest::new(None, Some("Intro"));
        request.video = request
            .video
            .with_file("intro.mp4", "video/mp4", vec![0u8; 64])
            .with_times("00:00", "00:10");

        let response = service
            .upload(&editor(Uuid::new_v4()), request)
            .await
            .unwrap();

        let upload = h.videos.snapshot(response.id).unwrap();
        assert_eq!(upload.title, "Intro");
        assert!(upload.video.key.starts_with("video-uploads/videos/intro-video-"));
        assert_eq!(upload.video.end_time, "00:10");
        assert_eq!(h.progress.get_total(response.id).await.unwrap(), 0);
    }
}
