//! Identity extraction and authorization checks

pub mod middleware;
pub mod models;

pub use middleware::{auth_middleware, AuthState};
pub use models::{IdentityContext, JwtClaims, UserRole};
