//! PostgreSQL video upload repository tests.
//!
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use glossa_core::models::{NewVideoUpload, SlotPatch};
use glossa_core::AppError;
use glossa_db::{PgVideoUploadRepository, VideoUploadRepository};
use helpers::setup_test_db;
use uuid::Uuid;

#[tokio::test]
async fn test_video_upload_lifecycle() {
    let db = setup_test_db().await;
    let repo = PgVideoUploadRepository::new(db.pool.clone());
    let upload = repo
        .create(NewVideoUpload {
            id: None,
            organization_id: Uuid::new_v4(),
            title: "Intro".to_string(),
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();
    assert!(!upload.video.has_key());

    repo.apply_video_update(
        upload.id,
        SlotPatch::media("videos/intro.mp4", "", "00:00", "00:30"),
    )
    .await
    .unwrap();
    repo.set_title(upload.id, "Intro v2").await.unwrap();

    let stored = repo.get_by_id(upload.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Intro v2");
    assert_eq!(stored.video.key, "videos/intro.mp4");
    assert_eq!(stored.video.end_time, "00:30");

    repo.apply_video_update(upload.id, SlotPatch::ClearKey)
        .await
        .unwrap();
    let cleared = repo.get_by_id(upload.id).await.unwrap().unwrap();
    assert_eq!(cleared.video.key, "");
    assert_eq!(cleared.video.start_time, "00:00");

    assert!(repo.delete(upload.id).await.unwrap());
    assert!(repo.get_by_id(upload.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_video_upload_is_not_found() {
    let db = setup_test_db().await;
    let repo = PgVideoUploadRepository::new(db.pool.clone());
    let id = Uuid::new_v4();

    assert!(matches!(
        repo.apply_video_update(id, SlotPatch::ClearKey).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        repo.set_title(id, "x").await,
        Err(AppError::NotFound(_))
    ));
    assert!(!repo.delete(id).await.unwrap());
}
