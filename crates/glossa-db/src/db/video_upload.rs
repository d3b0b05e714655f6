use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glossa_core::models::{MediaSlot, NewVideoUpload, SlotPatch, VideoUpload};
use glossa_core::AppError;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

/// Persistence for standalone video uploads
#[async_trait]
pub trait VideoUploadRepository: Send + Sync {
    async fn create(&self, new: NewVideoUpload) -> Result<VideoUpload, AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<VideoUpload>, AppError>;

    async fn set_title(&self, id: Uuid, title: &str) -> Result<(), AppError>;

    /// Apply a patch to the video slot; fails with `NotFound` for unknown ids
    async fn apply_video_update(&self, id: Uuid, patch: SlotPatch) -> Result<(), AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Debug, FromRow)]
struct VideoUploadRow {
    id: Uuid,
    organization_id: Uuid,
    title: String,
    video: Json<MediaSlot>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VideoUploadRow> for VideoUpload {
    fn from(row: VideoUploadRow) -> Self {
        VideoUpload {
            id: row.id,
            organization_id: row.organization_id,
            title: row.title,
            video: row.video.0,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgVideoUploadRepository {
    pool: PgPool,
}

impl PgVideoUploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Video upload {} not found", id))
    }
}

#[async_trait]
impl VideoUploadRepository for PgVideoUploadRepository {
    #[tracing::instrument(skip(self, new), fields(db.table = "video_uploads", db.operation = "insert"))]
    async fn create(&self, new: NewVideoUpload) -> Result<VideoUpload, AppError> {
        let row = sqlx::query_as::<Postgres, VideoUploadRow>(
            r#"
            INSERT INTO video_uploads (id, organization_id, title, video, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, organization_id, title, video, created_by, created_at, updated_at
            "#,
        )
        .bind(new.id.unwrap_or_else(Uuid::new_v4))
        .bind(new.organization_id)
        .bind(&new.title)
        .bind(Json(MediaSlot::default()))
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self), fields(db.table = "video_uploads", db.operation = "select", db.record_id = %id))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<VideoUpload>, AppError> {
        let row = sqlx::query_as::<Postgres, VideoUploadRow>(
            "SELECT id, organization_id, title, video, created_by, created_at, updated_at FROM video_uploads WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VideoUpload::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "video_uploads", db.operation = "update", db.record_id = %id))]
    async fn set_title(&self, id: Uuid, title: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE video_uploads SET title = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(title)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = "video_uploads", db.operation = "update_slot", db.record_id = %id))]
    async fn apply_video_update(&self, id: Uuid, patch: SlotPatch) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<Postgres, Json<MediaSlot>>(
            "SELECT video FROM video_uploads WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Self::not_found(id))?;

        let mut video = current.0;
        patch.apply_to_media(&mut video);

        sqlx::query("UPDATE video_uploads SET video = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(Json(&video))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "video_uploads", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM video_uploads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
