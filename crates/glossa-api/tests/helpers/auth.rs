use glossa_api::auth::JwtClaims;
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

/// Must match the secret in `create_test_config`.
pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-chars";

/// Caller of the API in tests
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

pub fn sign_token(user_id: Uuid, organization_id: Uuid, role: &str, exp_offset: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: user_id,
        org_id: organization_id,
        lang_id: 1,
        role: role.to_string(),
        exp: now + exp_offset,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// A user of a fresh organization with the given role
pub fn test_user(role: &str) -> TestUser {
    test_user_in(Uuid::new_v4(), role)
}

pub fn test_user_in(organization_id: Uuid, role: &str) -> TestUser {
    let user_id = Uuid::new_v4();
    TestUser {
        user_id,
        organization_id,
        role: role.to_string(),
        token: sign_token(user_id, organization_id, role, 3600),
    }
}
