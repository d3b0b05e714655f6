//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p glossa-api`. Repositories, storage and the
//! progress store are in-memory, so no database, Redis or object store is needed.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use glossa_api::constants;
use glossa_api::setup::routes;
use glossa_api::state::{AppState, DbState};
use glossa_core::config::{BaseConfig, ServiceConfig};
use glossa_core::models::DocumentKind;
use glossa_core::{Config, StorageBackend, UploadMode};
use glossa_db::test_helpers::{MockDocumentRepository, MockVideoUploadRepository};
use glossa_infra::MemoryProgressStore;
use glossa_storage::test_helpers::MockStorage;
use std::sync::Arc;

/// API path prefix for tests (e.g. `/api/v1`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus handles on the in-memory collaborators.
pub struct TestApp {
    pub server: TestServer,
    pub topics: MockDocumentRepository,
    pub vocabularies: MockDocumentRepository,
    pub video_uploads: MockVideoUploadRepository,
    pub storage: MockStorage,
    pub progress: MemoryProgressStore,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn create_test_config(mode: UploadMode) -> Config {
    Config(Box::new(ServiceConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 1,
            jwt_secret: auth::TEST_JWT_SECRET.to_string(),
            environment: "test".to_string(),
            log_format: "text".to_string(),
        },
        database_url: "postgresql://localhost/glossa_test".to_string(),
        redis_url: None,
        storage_backend: Some(StorageBackend::Local),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: None,
        local_storage_base_url: None,
        signed_url_ttl_secs: 300,
        upload_mode: mode,
        upload_lease_ttl_secs: 60,
        max_image_size_bytes: 64 * 1024,
        max_video_size_bytes: 256 * 1024,
        max_audio_size_bytes: 128 * 1024,
    }))
}

/// Setup test app with inline uploads.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_mode(UploadMode::Inline).await
}

pub async fn setup_test_app_with_mode(mode: UploadMode) -> TestApp {
    let topics = MockDocumentRepository::new(DocumentKind::Topic);
    let vocabularies = MockDocumentRepository::new(DocumentKind::Vocabulary);
    let video_uploads = MockVideoUploadRepository::new();
    let storage = MockStorage::new();
    let progress = MemoryProgressStore::new();

    let db = DbState {
        pool: None,
        topics: Arc::new(topics.clone()),
        vocabularies: Arc::new(vocabularies.clone()),
        video_uploads: Arc::new(video_uploads.clone()),
    };
    let state = Arc::new(AppState::new(
        create_test_config(mode),
        db,
        Arc::new(storage.clone()),
        Arc::new(progress.clone()),
    ));

    let app = routes::setup_routes(state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        topics,
        vocabularies,
        video_uploads,
        storage,
        progress,
    }
}
