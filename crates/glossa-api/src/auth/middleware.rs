use crate::auth::models::{IdentityContext, JwtClaims, UserRole};
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use glossa_core::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;

/// Verifies HS256 identity tokens signed with the shared secret
#[derive(Clone)]
pub struct AuthState {
    key: DecodingKey,
    validation: Validation,
}

impl AuthState {
    pub fn new(jwt_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token and turn its claims into an identity
    pub fn authenticate(&self, token: &str) -> Result<IdentityContext, AppError> {
        let token_data =
            decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::Unauthorized("Token has expired".to_string())
                    }
                    _ => AppError::Unauthorized(format!("Invalid or expired token: {}", e)),
                }
            })?;

        let claims = token_data.claims;
        let role: UserRole = claims.role.parse()?;
        Ok(IdentityContext {
            user_id: claims.sub,
            organization_id: claims.org_id,
            app_language_id: claims.lang_id,
            role,
        })
    }
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = match bearer_token(&request).and_then(|token| auth_state.authenticate(token)) {
        Ok(identity) => identity,
        Err(e) => return HttpAppError(e).into_response(),
    };

    tracing::debug!(
        user_id = %identity.user_id,
        organization_id = %identity.organization_id,
        role = %identity.role,
        "Request authenticated"
    );

    request.extensions_mut().insert(identity);
    next.run(request).await
}
