//! API constants
//!
//! Every endpoint except health checks and docs is served under [`API_PREFIX`].

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

/// Current API version
pub const API_VERSION: &str = "v1";

/// Versioned prefix for all API routes
pub const API_PREFIX: &str = "/api/v1";
