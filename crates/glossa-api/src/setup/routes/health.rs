//! Health check handlers and response types.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Run an async check with timeout; returns status string "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    pub status: String,
    /// Absent when repositories are not backed by PostgreSQL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub progress_store: String,
    pub storage: String,
}

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Dependency health: database, progress store and object storage.
///
/// Storage problems degrade the service; database or progress store problems make it unhealthy.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy or degraded", body = HealthCheckResponse),
        (status = 503, description = "A critical dependency is down", body = HealthCheckResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match state.db.pool.clone() {
        Some(pool) => Some(
            run_check(
                TIMEOUT,
                async move { sqlx::query("SELECT 1").execute(&pool).await.map(drop) },
                "unhealthy",
            )
            .await,
        ),
        None => None,
    };

    let progress = state.upload.progress.clone();
    let progress_store = run_check(TIMEOUT, async move { progress.ping().await }, "unhealthy").await;

    let storage = state.media.storage.clone();
    let storage = run_check(
        TIMEOUT,
        async move {
            storage
                .exists("health-check-non-existent-key")
                .await
                .map(drop)
        },
        "degraded",
    )
    .await;

    let critical_healthy = database.as_deref().map_or(true, |db| db == "healthy")
        && progress_store == "healthy";
    let status = if !critical_healthy {
        "unhealthy"
    } else if storage != "healthy" {
        "degraded"
    } else {
        "healthy"
    };

    if !critical_healthy {
        tracing::error!(
            database = ?database,
            progress_store = %progress_store,
            "Health check failed"
        );
    }

    let status_code = if critical_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthCheckResponse {
            status: status.to_string(),
            database,
            progress_store,
            storage,
        }),
    )
}
