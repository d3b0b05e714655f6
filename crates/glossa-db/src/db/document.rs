use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glossa_core::models::{
    DocumentKind, ImageSlotName, LanguageConfig, LanguageFields, MediaDocument, NewMediaDocument,
    SlotName, SlotPatch,
};
use glossa_core::AppError;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

const DOCUMENT_COLUMNS: &str = "id, kind, organization_id, topic_id, is_published, language_configs, created_by, created_at, updated_at";

/// Persistence for topic and vocabulary documents.
///
/// One implementation serves both kinds; every operation is scoped to [`Self::kind`].
/// Slot and language-config updates touch exactly one element and create any
/// missing language config or slot instead of silently doing nothing.
#[async_trait]
pub trait MediaDocumentRepository: Send + Sync {
    fn kind(&self) -> DocumentKind;

    /// Insert a document with no language configs, generating an id if absent
    async fn create(&self, new: NewMediaDocument) -> Result<MediaDocument, AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<MediaDocument>, AppError>;

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        published: Option<bool>,
    ) -> Result<Vec<MediaDocument>, AppError>;

    /// Fails with `NotFound` when the document does not exist
    async fn set_published(&self, id: Uuid, is_published: bool) -> Result<(), AppError>;

    /// Fails with `NotFound` when the document does not exist
    async fn set_topic(&self, id: Uuid, topic_id: Option<Uuid>) -> Result<(), AppError>;

    /// Overwrite the text of the language config for `language_id`, appending it if absent.
    async fn set_language_config(
        &self,
        id: Uuid,
        language_id: i32,
        fields: LanguageFields,
    ) -> Result<MediaDocument, AppError>;

    /// Apply a partial update to one slot of one language config.
    async fn apply_slot_update(
        &self,
        id: Uuid,
        language_id: i32,
        slot: SlotName,
        patch: SlotPatch,
    ) -> Result<(), AppError>;

    /// Returns false when nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn set_image_slot(
        &self,
        id: Uuid,
        language_id: i32,
        slot: ImageSlotName,
        key: &str,
        link_url: &str,
    ) -> Result<(), AppError> {
        self.apply_slot_update(id, language_id, SlotName::Image(slot), SlotPatch::image(key, link_url))
            .await
    }

    async fn set_video_slot(
        &self,
        id: Uuid,
        language_id: i32,
        key: &str,
        link_url: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<(), AppError> {
        self.apply_slot_update(
            id,
            language_id,
            SlotName::Video,
            SlotPatch::media(key, link_url, start_time, end_time),
        )
        .await
    }

    async fn set_audio_slot(
        &self,
        id: Uuid,
        language_id: i32,
        key: &str,
        link_url: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<(), AppError> {
        self.apply_slot_update(
            id,
            language_id,
            SlotName::Audio,
            SlotPatch::media(key, link_url, start_time, end_time),
        )
        .await
    }

    async fn delete_image_key_only(
        &self,
        id: Uuid,
        language_id: i32,
        slot: ImageSlotName,
    ) -> Result<(), AppError> {
        self.apply_slot_update(id, language_id, SlotName::Image(slot), SlotPatch::ClearKey)
            .await
    }

    async fn delete_video_key_only(&self, id: Uuid, language_id: i32) -> Result<(), AppError> {
        self.apply_slot_update(id, language_id, SlotName::Video, SlotPatch::ClearKey)
            .await
    }

    async fn delete_audio_key_only(&self, id: Uuid, language_id: i32) -> Result<(), AppError> {
        self.apply_slot_update(id, language_id, SlotName::Audio, SlotPatch::ClearKey)
            .await
    }
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    kind: String,
    organization_id: Uuid,
    topic_id: Option<Uuid>,
    is_published: bool,
    language_configs: Json<Vec<LanguageConfig>>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for MediaDocument {
    type Error = AppError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse::<DocumentKind>()
            .map_err(|e| AppError::Internal(format!("Corrupt document {}: {}", row.id, e)))?;
        Ok(MediaDocument {
            id: row.id,
            kind,
            organization_id: row.organization_id,
            topic_id: row.topic_id,
            is_published: row.is_published,
            language_configs: row.language_configs.0,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL document repository for one [`DocumentKind`]
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
    kind: DocumentKind,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool, kind: DocumentKind) -> Self {
        Self { pool, kind }
    }

    pub fn topics(pool: PgPool) -> Self {
        Self::new(pool, DocumentKind::Topic)
    }

    pub fn vocabularies(pool: PgPool) -> Self {
        Self::new(pool, DocumentKind::Vocabulary)
    }

    fn not_found(&self, id: Uuid) -> AppError {
        AppError::NotFound(format!("{} {} not found", self.kind.label(), id))
    }

    /// Read-modify-write of the language configs under a row lock, so concurrent
    /// updates for different languages never overwrite each other.
    async fn mutate_language_configs<F>(&self, id: Uuid, mutate: F) -> Result<MediaDocument, AppError>
    where
        F: FnOnce(&mut MediaDocument) + Send,
    {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            "SELECT {} FROM media_documents WHERE id = $1 AND kind = $2 FOR UPDATE",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .bind(self.kind.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| self.not_found(id))?;

        let mut document = MediaDocument::try_from(row)?;
        mutate(&mut document);

        let updated_at: DateTime<Utc> = sqlx::query_scalar::<Postgres, DateTime<Utc>>(
            r#"
            UPDATE media_documents
            SET language_configs = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING updated_at
            "#,
        )
        .bind(id)
        .bind(Json(&document.language_configs))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        document.updated_at = updated_at;
        Ok(document)
    }
}

#[async_trait]
impl MediaDocumentRepository for PgDocumentRepository {
    fn kind(&self) -> DocumentKind {
        self.kind
    }

    #[tracing::instrument(skip(self, new), fields(db.table = "media_documents", db.operation = "insert", kind = %self.kind))]
    async fn create(&self, new: NewMediaDocument) -> Result<MediaDocument, AppError> {
        let id = new.id.unwrap_or_else(Uuid::new_v4);
        let row = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            r#"
            INSERT INTO media_documents (id, kind, organization_id, topic_id, is_published, language_configs, created_by)
            VALUES ($1, $2, $3, $4, $5, '[]'::jsonb, $6)
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .bind(self.kind.as_str())
        .bind(new.organization_id)
        .bind(new.topic_id)
        .bind(new.is_published)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await?;

        MediaDocument::try_from(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_documents", db.operation = "select", db.record_id = %id))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<MediaDocument>, AppError> {
        let row = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            "SELECT {} FROM media_documents WHERE id = $1 AND kind = $2",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .bind(self.kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(MediaDocument::try_from).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_documents", db.operation = "select_list"))]
    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        published: Option<bool>,
    ) -> Result<Vec<MediaDocument>, AppError> {
        let rows = sqlx::query_as::<Postgres, DocumentRow>(&format!(
            r#"
            SELECT {} FROM media_documents
            WHERE organization_id = $1 AND kind = $2
              AND ($3::BOOLEAN IS NULL OR is_published = $3)
            ORDER BY created_at DESC
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(organization_id)
        .bind(self.kind.as_str())
        .bind(published)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MediaDocument::try_from).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_documents", db.operation = "update", db.record_id = %id))]
    async fn set_published(&self, id: Uuid, is_published: bool) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE media_documents SET is_published = $3, updated_at = NOW() WHERE id = $1 AND kind = $2",
        )
        .bind(id)
        .bind(self.kind.as_str())
        .bind(is_published)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.not_found(id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_documents", db.operation = "update", db.record_id = %id))]
    async fn set_topic(&self, id: Uuid, topic_id: Option<Uuid>) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE media_documents SET topic_id = $3, updated_at = NOW() WHERE id = $1 AND kind = $2",
        )
        .bind(id)
        .bind(self.kind.as_str())
        .bind(topic_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.not_found(id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, fields), fields(db.table = "media_documents", db.operation = "upsert_language", db.record_id = %id))]
    async fn set_language_config(
        &self,
        id: Uuid,
        language_id: i32,
        fields: LanguageFields,
    ) -> Result<MediaDocument, AppError> {
        self.mutate_language_configs(id, move |document| {
            document.upsert_language_config(language_id, fields);
        })
        .await
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = "media_documents", db.operation = "update_slot", db.record_id = %id, slot = %slot))]
    async fn apply_slot_update(
        &self,
        id: Uuid,
        language_id: i32,
        slot: SlotName,
        patch: SlotPatch,
    ) -> Result<(), AppError> {
        self.mutate_language_configs(id, move |document| {
            document.apply_slot_patch(language_id, slot, &patch);
        })
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_documents", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM media_documents WHERE id = $1 AND kind = $2")
            .bind(id)
            .bind(self.kind.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
