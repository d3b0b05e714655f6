//! HTTP error response conversion
//!
//! This module provides ErrorResponse type for HTTP error responses.
//! Note: IntoResponse implementation for AppError lives in the binary crate (glossa-api)
//! due to Rust's orphan rule: external traits (axum::IntoResponse) for external types
//! (glossa_core::AppError) cannot be implemented in library crates.

use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response format for HTTP APIs
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code, e.g. `UPLOAD_IN_PROGRESS`
    pub code: String,
    /// Whether retrying the same request may succeed
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}
