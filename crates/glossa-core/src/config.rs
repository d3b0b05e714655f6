//! Configuration module
//!
//! This module provides the service configuration: HTTP server, database pool,
//! progress store, identity tokens, object storage and upload limits.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SIGNED_URL_TTL_SECS: u64 = 3600;
const UPLOAD_LEASE_TTL_SECS: u64 = 900;
const MAX_IMAGE_SIZE_MB: usize = 10;
const MAX_VIDEO_SIZE_MB: usize = 500;
const MAX_AUDIO_SIZE_MB: usize = 100;

/// How the upload runner is driven for a multipart upload request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// The request waits for every slot to be stored and persisted
    Inline,
    /// The request returns once the entity is persisted; slots run on a supervised task
    Background,
}

impl FromStr for UploadMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" | "sync" => Ok(UploadMode::Inline),
            "background" | "async" => Ok(UploadMode::Background),
            _ => Err(anyhow::anyhow!("Invalid upload mode: {}", s)),
        }
    }
}

impl Display for UploadMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadMode::Inline => write!(f, "inline"),
            UploadMode::Background => write!(f, "background"),
        }
    }
}

/// Base configuration for the HTTP surface
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
    pub log_format: String,
}

/// Media service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    pub database_url: String,
    /// Progress counter store; the in-memory store is used when unset
    pub redis_url: Option<String>,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub signed_url_ttl_secs: u64,
    // Upload configuration
    pub upload_mode: UploadMode,
    pub upload_lease_ttl_secs: u64,
    pub max_image_size_bytes: usize,
    pub max_video_size_bytes: usize,
    pub max_audio_size_bytes: usize,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn as_service(&self) -> &ServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_service().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_service().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_service().base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_service().base.jwt_secret
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_service().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_service().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.as_service().base.log_format
    }

    pub fn database_url(&self) -> &str {
        &self.as_service().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_service().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_service().base.db_timeout_seconds
    }

    pub fn redis_url(&self) -> Option<&str> {
        self.as_service().redis_url.as_deref()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_service()
            .storage_backend
            .unwrap_or(StorageBackend::S3)
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_service().s3_bucket.as_deref()
    }

    /// S3_REGION wins over AWS_REGION
    pub fn s3_region(&self) -> Option<&str> {
        self.as_service()
            .s3_region
            .as_deref()
            .or(self.as_service().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_service().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_service().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_service().local_storage_base_url.as_deref()
    }

    pub fn signed_url_ttl_secs(&self) -> u64 {
        self.as_service().signed_url_ttl_secs
    }

    pub fn upload_mode(&self) -> UploadMode {
        self.as_service().upload_mode
    }

    pub fn upload_lease_ttl_secs(&self) -> u64 {
        self.as_service().upload_lease_ttl_secs
    }

    pub fn max_image_size_bytes(&self) -> usize {
        self.as_service().max_image_size_bytes
    }

    pub fn max_video_size_bytes(&self) -> usize {
        self.as_service().max_video_size_bytes
    }

    pub fn max_audio_size_bytes(&self) -> usize {
        self.as_service().max_audio_size_bytes
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn env_mb(name: &str, default_mb: usize) -> usize {
    env::var(name)
        .unwrap_or_else(|_| default_mb.to_string())
        .parse::<usize>()
        .unwrap_or(default_mb)
        * 1024
        * 1024
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .to_lowercase(),
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(s) => Some(s.parse::<StorageBackend>()?),
            Err(_) => None,
        };

        let upload_mode = match env::var("UPLOAD_MODE") {
            Ok(s) => s.parse::<UploadMode>()?,
            Err(_) => UploadMode::Inline,
        };

        let config = ServiceConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.trim().is_empty()),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            signed_url_ttl_secs: env::var("SIGNED_URL_TTL_SECS")
                .unwrap_or_else(|_| SIGNED_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(SIGNED_URL_TTL_SECS),
            upload_mode,
            upload_lease_ttl_secs: env::var("UPLOAD_LEASE_TTL_SECS")
                .unwrap_or_else(|_| UPLOAD_LEASE_TTL_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_LEASE_TTL_SECS),
            max_image_size_bytes: env_mb("MAX_IMAGE_SIZE_MB", MAX_IMAGE_SIZE_MB),
            max_video_size_bytes: env_mb("MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB),
            max_audio_size_bytes: env_mb("MAX_AUDIO_SIZE_MB", MAX_AUDIO_SIZE_MB),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if let Some(ref url) = self.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(anyhow::anyhow!("REDIS_URL must use the redis:// scheme"));
            }
        }

        if self.signed_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be greater than 0"));
        }

        if self.upload_lease_ttl_secs == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_LEASE_TTL_SECS must be greater than 0"
            ));
        }

        // Validate storage backend configuration
        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
