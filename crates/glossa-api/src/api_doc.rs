//! OpenAPI documentation.
//!
//! Document endpoints are shared by the `topics` and `vocabularies` collections and
//! are documented once with a `{collection}` path parameter.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use crate::setup::routes::health;
use glossa_core::models;

/// Returns the OpenAPI spec served at `/api/openapi.json`
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Glossa API",
        version = "0.1.0",
        description = "Multilingual learning content API: topics and vocabulary entries with per-language text and media slots, standalone video uploads, and upload progress. All endpoints are versioned under /api/v1/."
    ),
    paths(
        // Topics and vocabularies
        handlers::documents::upload_document,
        handlers::documents::get_document,
        handlers::documents::list_documents,
        handlers::documents::publish_document,
        handlers::documents::delete_document,
        handlers::upload_progress::get_upload_progress,
        // Video uploads
        handlers::video_uploads::upload_video,
        handlers::video_uploads::get_video_upload,
        handlers::video_uploads::delete_video_upload,
        // Health
        health::health_check,
    ),
    components(
        schemas(
            models::DocumentKind,
            models::MediaDocumentView,
            models::LanguageConfigView,
            models::ImageSlotView,
            models::MediaSlotView,
            models::VideoUploadView,
            models::UploadResponse,
            models::UploadWarning,
            models::UploadProgress,
            models::UploadErrors,
            handlers::documents::PublishRequest,
            handlers::DeleteResponse,
            health::HealthCheckResponse,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "documents", description = "Topic and vocabulary upload, retrieval, publication and deletion"),
        (name = "video-uploads", description = "Standalone video uploads"),
        (name = "health", description = "Service health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_document_and_video_paths() {
        let spec = get_openapi_spec();
        let paths: Vec<&String> = spec.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| *p == "/api/v1/{collection}/upload"));
        assert!(paths.iter().any(|p| *p == "/api/v1/{collection}/{id}/upload-progress"));
        assert!(paths.iter().any(|p| *p == "/api/v1/video-uploads"));
        assert!(spec
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
