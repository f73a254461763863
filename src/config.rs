//! Environment-driven configuration: a single flat struct populated by
//! `Config::from_env()`, covering the full env surface this system
//! recognizes.

use std::time::Duration;

use crate::db::pool::DatabaseConfig;
use crate::kv::RedisConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub idle_timeout: Duration,
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ExternalConfig {
    pub yahoo_app_id: Option<String>,
    pub favicon_api_timeout: Duration,
    pub favicon_rate_limit_window: Duration,
    pub favicon_cache_ttl: Duration,
    pub favicon_negative_ttl: Duration,
    pub rss_feed_urls: Vec<String>,
    pub bookmark_api_timeout: Duration,
    pub bookmark_api_max_urls: usize,
    pub keyphrase_api_key: Option<String>,
    pub keyphrase_api_timeout: Duration,
    pub keyphrase_top_n: usize,
    pub keyphrase_min_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub timezone: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub cache_enabled: bool,
    pub api_base_path: String,
    pub archive_min_users_whitelist: Vec<i64>,
    pub archive_ttl_today: Option<Duration>,
    pub archive_ttl_past: Option<Duration>,
    pub archive_ttl_default: Duration,
    pub external: ExternalConfig,
    pub ingest_max_entries: usize,
    pub updater_batch_size: usize,
    pub updater_chunk_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: env_parse_or("SERVER_PORT", 8080)?,
                read_timeout: secs_env_or("SERVER_READ_TIMEOUT_SECS", 10)?,
                write_timeout: secs_env_or("SERVER_WRITE_TIMEOUT_SECS", 10)?,
                idle_timeout: secs_env_or("SERVER_IDLE_TIMEOUT_SECS", 60)?,
                shutdown_timeout: secs_env_or("SERVER_SHUTDOWN_TIMEOUT_SECS", 15)?,
            },
            database: DatabaseConfig {
                host: env_or("POSTGRES_HOST", "localhost"),
                port: env_parse_or("POSTGRES_PORT", 5432)?,
                user: env_or("POSTGRES_USER", "hateblog"),
                password: env_or("POSTGRES_PASSWORD", ""),
                database: env_or("POSTGRES_DB", "hateblog"),
                sslmode: env_or("POSTGRES_SSLMODE", "prefer"),
                min_connections: env_parse_or("POSTGRES_POOL_MIN", 2)?,
                max_connections: env_parse_or("POSTGRES_POOL_MAX", 10)?,
                connect_timeout: secs_env_or("POSTGRES_CONNECT_TIMEOUT_SECS", 5)?,
                idle_timeout: secs_env_or("POSTGRES_IDLE_TIMEOUT_SECS", 600)?,
                max_lifetime: secs_env_or("POSTGRES_MAX_LIFETIME_SECS", 3600)?,
            },
            redis: RedisConfig {
                host: env_or("REDIS_HOST", "localhost"),
                port: env_parse_or("REDIS_PORT", 6379)?,
                password: std::env::var("REDIS_PASSWORD").ok(),
                db: env_parse_or("REDIS_DB", 0)?,
                pool_size: env_parse_or("REDIS_POOL_SIZE", 10)?,
                connect_timeout: secs_env_or("REDIS_CONNECT_TIMEOUT_SECS", 5)?,
                command_timeout: secs_env_or("REDIS_COMMAND_TIMEOUT_SECS", 2)?,
            },
            timezone: env_or("APP_TIMEZONE", "UTC"),
            log_level: env_or("APP_LOG_LEVEL", "info"),
            log_format: match env_or("APP_LOG_FORMAT", "text").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Text,
            },
            cache_enabled: env_parse_or("APP_CACHE_ENABLED", true)?,
            api_base_path: env_or("APP_API_BASE_PATH", "/api/v1"),
            archive_min_users_whitelist: vec![5, 10, 50, 100, 500, 1000],
            archive_ttl_today: env_secs_opt("APP_ARCHIVE_TTL_TODAY_SECS")?,
            archive_ttl_past: env_secs_opt("APP_ARCHIVE_TTL_PAST_SECS")?,
            archive_ttl_default: secs_env_or("APP_ARCHIVE_TTL_SECS", 300)?,
            external: ExternalConfig {
                yahoo_app_id: std::env::var("YAHOO_APP_ID").ok(),
                favicon_api_timeout: secs_env_or("FAVICON_API_TIMEOUT_SECS", 3)?,
                favicon_rate_limit_window: secs_env_or("FAVICON_RATE_LIMIT_WINDOW_SECS", 60)?,
                favicon_cache_ttl: secs_env_or("FAVICON_CACHE_TTL_SECS", 7 * 24 * 3600)?,
                favicon_negative_ttl: secs_env_or("FAVICON_NEGATIVE_TTL_SECS", 300)?,
                rss_feed_urls: std::env::var("RSS_FEED_URLS")
                    .unwrap_or_default()
                    .split('|')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
                bookmark_api_timeout: secs_env_or("BOOKMARK_API_TIMEOUT_SECS", 5)?,
                bookmark_api_max_urls: env_parse_or("BOOKMARK_API_MAX_URLS", 50)?,
                keyphrase_api_key: std::env::var("KEYPHRASE_API_KEY").ok(),
                keyphrase_api_timeout: secs_env_or("KEYPHRASE_API_TIMEOUT_SECS", 5)?,
                keyphrase_top_n: env_parse_or("KEYPHRASE_TOP_N", 5)?,
                keyphrase_min_interval: secs_env_or("KEYPHRASE_MIN_INTERVAL_SECS", 1)?,
            },
            ingest_max_entries: env_parse_or("INGEST_MAX_ENTRIES", 300)?,
            updater_batch_size: env_parse_or("UPDATER_BATCH_SIZE", 200)?,
            updater_chunk_size: env_parse_or("UPDATER_CHUNK_SIZE", 50)?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

fn env_or(key: &'static str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(v) => v.parse().map_err(|_| ConfigError::InvalidValue(key, v)),
        Err(_) => Ok(default),
    }
}

fn secs_env_or(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    env_parse_or(key, default).map(Duration::from_secs)
}

fn env_secs_opt(key: &'static str) -> Result<Option<Duration>, ConfigError> {
    match std::env::var(key) {
        Ok(v) => v
            .parse::<u64>()
            .map(|s| Some(Duration::from_secs(s)))
            .map_err(|_| ConfigError::InvalidValue(key, v)),
        Err(_) => Ok(None),
    }
}
