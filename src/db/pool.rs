//! Postgres connection pool with health checking.
//!
//! Provides async connection pooling, a cheap liveness probe for the
//! HTTP health endpoint, and the shared `PgPool` handed to [`crate::db::EntryStore`]
//! and [`crate::jobguard::JobGuard`].

use std::time::{Duration, Instant};

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;

use crate::error::DbError;

/// Postgres pool configuration, sourced 1:1 from `POSTGRES_*` env vars (see [`crate::config::Config`]).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub sslmode: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "hateblog".to_string(),
            password: String::new(),
            database: "hateblog".to_string(),
            sslmode: "prefer".to_string(),
            min_connections: 2,
            max_connections: 10,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(3600),
        }
    }
}

/// Result of a single health probe, surfaced by `GET /health`.
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub is_healthy: bool,
    pub latency: Duration,
}

/// Thin wrapper over `sqlx::PgPool` adding a bounded health probe.
#[derive(Clone)]
pub struct ConnectionPool {
    pool: PgPool,
}

impl ConnectionPool {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .ssl_mode(parse_sslmode(&config.sslmode))
            .disable_statement_logging();

        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .max_lifetime(Some(config.max_lifetime))
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn inner(&self) -> &PgPool {
        &self.pool
    }

    /// `SELECT 1` under a 3s sub-deadline.
    pub async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let probe = tokio::time::timeout(Duration::from_secs(3), async {
            sqlx::query("SELECT 1").execute(&self.pool).await
        })
        .await;

        let is_healthy = matches!(probe, Ok(Ok(_)));
        HealthCheckResult {
            is_healthy,
            latency: start.elapsed(),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_sslmode(mode: &str) -> sqlx::postgres::PgSslMode {
    use sqlx::postgres::PgSslMode;
    match mode {
        "disable" => PgSslMode::Disable,
        "allow" => PgSslMode::Allow,
        "require" => PgSslMode::Require,
        "verify-ca" => PgSslMode::VerifyCa,
        "verify-full" => PgSslMode::VerifyFull,
        _ => PgSslMode::Prefer,
    }
}
