//! Configuration module
//!
//! Configuration is read from the environment (after loading an optional `.env` file) and
//! covers the HTTP server, the database, the blob store and the feed/pagination limits.

use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 10;
const FEED_DEFAULT_LIMIT: u32 = 20;
const FEED_MAX_LIMIT: u32 = 100;
const COMMENT_MAX_LENGTH: usize = 2000;
const LOCAL_STORAGE_PATH: &str = "./data/media";
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Scheme prefix selecting the in-process engine instead of Postgres.
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// Pagination and comment limits applied by the feed service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedConfig {
    /// Page size used when the caller does not pass `limit`
    pub default_limit: u32,
    /// Upper bound; larger requested limits are clamped to it
    pub max_limit: u32,
    /// Maximum comment length in characters (after trimming)
    pub comment_max_length: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: FEED_DEFAULT_LIMIT,
            max_limit: FEED_MAX_LIMIT,
            comment_max_length: COMMENT_MAX_LENGTH,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub http_concurrency_limit: usize,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub storage_backend: StorageBackend,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub max_file_size_bytes: usize,
    pub feed: FeedConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (the environment in production).
    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port: u16 = lookup("PORT")
            .unwrap_or_else(|| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Local,
        };

        let max_file_size_mb = lookup("MAX_FILE_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_FILE_SIZE_MB);

        let feed = FeedConfig {
            default_limit: lookup("FEED_DEFAULT_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(FEED_DEFAULT_LIMIT),
            max_limit: lookup("FEED_MAX_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(FEED_MAX_LIMIT),
            comment_max_length: lookup("COMMENT_MAX_LENGTH")
                .and_then(|s| s.parse().ok())
                .unwrap_or(COMMENT_MAX_LENGTH),
        };

        let config = Config {
            server_port,
            environment,
            cors_origins,
            http_concurrency_limit: lookup("HTTP_CONCURRENCY_LIMIT")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            local_storage_path: lookup("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|| LOCAL_STORAGE_PATH.to_string()),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}/files", server_port)),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            feed,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database_url.trim().is_empty() {
            return Err(anyhow::anyhow!("DATABASE_URL must not be empty"));
        }
        if self.feed.default_limit == 0 || self.feed.max_limit == 0 {
            return Err(anyhow::anyhow!(
                "FEED_DEFAULT_LIMIT and FEED_MAX_LIMIT must be greater than zero"
            ));
        }
        if self.feed.default_limit > self.feed.max_limit {
            return Err(anyhow::anyhow!(
                "FEED_DEFAULT_LIMIT ({}) cannot exceed FEED_MAX_LIMIT ({})",
                self.feed.default_limit,
                self.feed.max_limit
            ));
        }
        if self.feed.comment_max_length == 0 {
            return Err(anyhow::anyhow!("COMMENT_MAX_LENGTH must be greater than zero"));
        }
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than zero"));
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Whether the in-process engine was requested instead of Postgres
    pub fn uses_memory_database(&self) -> bool {
        self.database_url.starts_with(MEMORY_DATABASE_URL)
    }
}
