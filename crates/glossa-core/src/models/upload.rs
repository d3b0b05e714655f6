use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Non-fatal problem met while replacing a slot, such as an orphaned object
/// left behind because its delete failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadWarning {
    pub slot: String,
    pub key: String,
    pub message: String,
}

/// Result of an upload request.
///
/// Slots are applied independently: a failed request may still have
/// committed the slots processed before the failure.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub id: Uuid,
    pub warnings: Vec<UploadWarning>,
    /// Set when slots are still being processed in the background
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub progress_pending: bool,
}
