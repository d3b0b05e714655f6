//! Route configuration and setup.

pub mod health;

pub use health::HealthCheckResponse;

use crate::auth::{auth_middleware, AuthState};
use crate::constants::API_PREFIX;
use crate::handlers::{documents, upload_progress, video_uploads};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, patch, post},
    Extension, Json, Router,
};
use glossa_core::models::DocumentKind;
use glossa_core::Config;
use glossa_infra::request_id_middleware;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(&state.config)?;
    let auth_state = Arc::new(AuthState::new(state.config.jwt_secret()));

    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        auth_state,
        auth_middleware,
    ));

    let app = public_routes()
        .merge(protected_routes)
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(RequestBodyLimitLayer::new(state.media.max_request_size()))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.cors_origins().iter().any(|origin| origin == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest(
            &format!("{}/{}", API_PREFIX, DocumentKind::Topic.collection()),
            document_routes(DocumentKind::Topic),
        )
        .nest(
            &format!("{}/{}", API_PREFIX, DocumentKind::Vocabulary.collection()),
            document_routes(DocumentKind::Vocabulary),
        )
        .nest(&format!("{}/video-uploads", API_PREFIX), video_upload_routes())
}

/// Routes of one document collection; handlers read the kind from the extension.
fn document_routes(kind: DocumentKind) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(documents::list_documents))
        .route("/upload", post(documents::upload_document))
        .route(
            "/{id}",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/{id}/publish", patch(documents::publish_document))
        .route(
            "/{id}/upload-progress",
            get(upload_progress::get_upload_progress),
        )
        .layer(Extension(kind))
}

fn video_upload_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(video_uploads::upload_video))
        .route(
            "/{id}",
            get(video_uploads::get_video_upload).delete(video_uploads::delete_video_upload),
        )
}
