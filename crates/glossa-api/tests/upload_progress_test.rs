//! Upload progress integration tests.
//!
//! Run with: `cargo test -p glossa-api --test upload_progress_test`

mod helpers;

use std::time::Duration;

use glossa_core::UploadMode;
use glossa_infra::ProgressStore;
use helpers::api_path;
use helpers::auth::{test_user, TestUser};
use helpers::fixtures::{colors_form, post_form, upload_ok, with_png};
use helpers::TestApp;
use uuid::Uuid;

async fn read_progress(app: &TestApp, user: &TestUser, id: Uuid) -> serde_json::Value {
    let response = app
        .client()
        .get(&api_path(&format!("/topics/{}/upload-progress", id)))
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    response.json()
}

#[tokio::test]
async fn test_idle_entity_reports_minus_one() {
    let app = helpers::setup_test_app().await;
    let user = test_user("editor");
    let (id, _) = upload_ok(app.client(), &api_path("/topics/upload"), &user, colors_form()).await;

    let progress = read_progress(&app, &user, id).await;
    assert_eq!(progress["progress"], -1);
    assert_eq!(progress["file_name"], "");
}

#[tokio::test]
async fn test_finished_job_is_reported_once() {
    let app = helpers::setup_test_app().await;
    let user = test_user("editor");
    let form = with_png(with_png(colors_form(), "icon"), "gif");
    let (id, _) = upload_ok(app.client(), &api_path("/topics/upload"), &user, form).await;

    let progress = read_progress(&app, &user, id).await;
    assert_eq!(progress["progress"], 100);
    assert_eq!(progress["file_name"], "colors");
    assert!(progress["errors"]["image_error"]
        .as_object()
        .unwrap()
        .is_empty());

    let progress = read_progress(&app, &user, id).await;
    assert_eq!(progress["progress"], -1);
}

#[tokio::test]
async fn test_failed_slot_is_reported_with_skipped_slots() {
    let app = helpers::setup_test_app().await;
    let user = test_user("editor");
    let (id, _) = upload_ok(app.client(), &api_path("/topics/upload"), &user, colors_form()).await;

    app.storage.fail_puts_matching("-icon-");
    let form = with_png(
        with_png(colors_form().add_text("id", id.to_string()), "icon"),
        "gif",
    );
    let response = post_form(app.client(), &api_path("/topics/upload"), &user, form).await;
    assert_eq!(response.status_code(), 502);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "STORAGE_ERROR");

    let progress = read_progress(&app, &user, id).await;
    assert_eq!(progress["progress"], 100);
    let image_errors = &progress["errors"]["image_error"];
    assert_eq!(image_errors["icon"], "Failed to access object storage");
    assert_eq!(image_errors["gif"], "skipped: earlier slot failed");
    assert!(progress["errors"]["audio_error"].is_null());

    // The gif slot was never written
    let stored = app.topics.snapshot(id).unwrap();
    assert!(stored.stored_keys().is_empty());
}

#[tokio::test]
async fn test_background_upload_completes() {
    let app = helpers::setup_test_app_with_mode(UploadMode::Background).await;
    let user = test_user("editor");
    let form = with_png(with_png(colors_form(), "full_background"), "order");

    let (id, body) = upload_ok(app.client(), &api_path("/topics/upload"), &user, form).await;
    assert_eq!(body["progress_pending"], true);

    let mut finished = false;
    for _ in 0..100 {
        let progress = read_progress(&app, &user, id).await;
        let value = progress["progress"].as_i64().unwrap();
        assert!((0..=100).contains(&value), "unexpected progress {}", value);
        if value == 100 {
            finished = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(finished, "background upload did not finish");

    let stored = app.topics.snapshot(id).unwrap();
    assert_eq!(stored.stored_keys().len(), 2);
}

#[tokio::test]
async fn test_background_upload_without_files_runs_inline() {
    let app = helpers::setup_test_app_with_mode(UploadMode::Background).await;
    let user = test_user("editor");

    let (id, body) = upload_ok(app.client(), &api_path("/topics/upload"), &user, colors_form()).await;
    assert!(body.get("progress_pending").is_none());
    assert_eq!(
        app.topics.snapshot(id).unwrap().language_config(1).unwrap().title,
        "Colors"
    );
}

#[tokio::test]
async fn test_concurrent_upload_is_conflict() {
    let app = helpers::setup_test_app().await;
    let user = test_user("editor");
    let (id, _) = upload_ok(app.client(), &api_path("/topics/upload"), &user, colors_form()).await;

    let token = app
        .progress
        .acquire_lease(id, Duration::from_secs(60))
        .await
        .unwrap()
        .unwrap();

    let form = with_png(colors_form().add_text("id", id.to_string()), "icon");
    let response = post_form(app.client(), &api_path("/topics/upload"), &user, form).await;
    assert_eq!(response.status_code(), 409);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UPLOAD_IN_PROGRESS");
    assert!(app.storage.puts().is_empty());

    let response = app
        .client()
        .delete(&api_path(&format!("/topics/{}", id)))
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(response.status_code(), 409);

    assert!(app.progress.release_lease(id, &token).await.unwrap());
    let form = with_png(colors_form().add_text("id", id.to_string()), "icon");
    upload_ok(app.client(), &api_path("/topics/upload"), &user, form).await;
}

#[tokio::test]
async fn test_progress_of_other_organization_is_forbidden() {
    let app = helpers::setup_test_app().await;
    let owner = test_user("editor");
    let (id, _) = upload_ok(app.client(), &api_path("/topics/upload"), &owner, colors_form()).await;

    let response = app
        .client()
        .get(&api_path(&format!("/topics/{}/upload-progress", id)))
        .add_header("Authorization", test_user("viewer").bearer())
        .await;
    assert_eq!(response.status_code(), 403);
}
