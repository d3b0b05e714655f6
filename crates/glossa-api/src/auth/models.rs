use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use glossa_core::AppError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// User role for authorization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Editor,
    Viewer,
}

impl UserRole {
    /// Admins and editors may create, update and delete content
    pub fn can_write(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Editor)
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "editor" => Ok(UserRole::Editor),
            "viewer" => Ok(UserRole::Viewer),
            _ => Err(AppError::Unauthorized("Invalid user role".to_string())),
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Editor => write!(f, "editor"),
            UserRole::Viewer => write!(f, "viewer"),
        }
    }
}

/// JWT claims issued by the gateway
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid, // user_id
    pub org_id: Uuid,
    pub lang_id: i32, // app language of the caller
    pub role: String, // "admin", "editor", or "viewer"
    pub exp: i64,     // expiration timestamp
    pub iat: i64,     // issued at timestamp
}

/// Caller identity extracted from the bearer token and stored in request extensions
#[derive(Debug, Clone)]
pub struct IdentityContext {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub app_language_id: i32,
    pub role: UserRole,
}

impl IdentityContext {
    pub fn require_write(&self) -> Result<(), AppError> {
        if self.role.can_write() {
            Ok(())
        } else {
            Err(AppError::AccessDenied(format!(
                "Role '{}' cannot modify content",
                self.role
            )))
        }
    }

    /// Entities are only visible to the organization that owns them
    pub fn require_organization(&self, organization_id: Uuid) -> Result<(), AppError> {
        if self.organization_id == organization_id {
            Ok(())
        } else {
            Err(AppError::AccessDenied(
                "Resource belongs to another organization".to_string(),
            ))
        }
    }
}

// Implement FromRequestParts for IdentityContext to work with Multipart
// Extension cannot be used with Multipart, so we extract directly from request parts
impl<S> FromRequestParts<S> for IdentityContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityContext>()
            .cloned()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing identity context".to_string(),
                ))
            })
    }
}
