use siterank_core::{AppError, QueueMode};

/// Default input query; the domain must be the first column.
pub const DEFAULT_LOAD_QUERY: &str = "SELECT domain FROM rank_domains";

/// Configuration for the relational store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Read configuration from environment variables.
    ///
    /// - `DATABASE_URL` (required)
    /// - `DATABASE_MAX_CONNECTIONS` (optional, defaults to 5)
    pub fn from_env() -> Result<Self, AppError> {
        let url = std::env::var("DATABASE_URL").map_err(|_| {
            AppError::ConfigError("DATABASE_URL not set. Required for database operations.".into())
        })?;

        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Err(_) => 5,
            Ok(raw) => parse_positive("DATABASE_MAX_CONNECTIONS", &raw)?,
        };

        Ok(Self {
            url,
            max_connections,
        })
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u32, AppError> {
    let parsed: u32 = raw.parse().map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid {name} '{raw}': must be a positive integer"
        ))
    })?;
    if parsed == 0 {
        return Err(AppError::ConfigError(format!("{name} must be at least 1")));
    }
    Ok(parsed)
}

/// Configuration for the Redis work queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub redis_url: String,
    pub key: String,
    pub mode: QueueMode,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1/".to_string(),
            key: "rank_domains".to_string(),
            mode: QueueMode::Set,
        }
    }
}

impl QueueConfig {
    /// Read configuration from environment variables.
    ///
    /// - `REDIS_URL` (optional, defaults to `redis://127.0.0.1/`)
    /// - `SITERANK_QUEUE_KEY` (optional, defaults to `rank_domains`)
    /// - `SITERANK_QUEUE_MODE` (optional, `list` or `set`, defaults to `set`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let mode = match lookup("SITERANK_QUEUE_MODE") {
            None => defaults.mode,
            Some(raw) => raw.parse()?,
        };

        Ok(Self {
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            key: lookup("SITERANK_QUEUE_KEY").unwrap_or(defaults.key),
            mode,
        })
    }
}
