//! Key-value façade over Redis.
//!
//! A thin wrapper around `redis::aio::ConnectionManager`: get/set with TTL,
//! setnx, raw-bytes get, pattern scan+delete, and a liveness ping. All typed
//! caching policy (key schemas, TTLs, codec) lives one layer up in
//! [`crate::cache`]; this module only knows about bytes.

use std::time::Duration;

use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::KvError;

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
    pub pool_size: u32,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
            pool_size: 10,
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(2),
        }
    }
}

impl RedisConfig {
    fn connection_url(&self) -> String {
        match &self.password {
            Some(pw) => format!("redis://:{}@{}:{}/{}", pw, self.host, self.port, self.db),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

/// Redis-backed key-value façade. Cheap to clone (`ConnectionManager` is
/// itself an `Arc`-wrapped handle that transparently reconnects).
#[derive(Clone)]
pub struct KVCache {
    conn: ConnectionManager,
    command_timeout: Duration,
}

impl KVCache {
    pub async fn connect(config: &RedisConfig) -> Result<Self, KvError> {
        let client = redis::Client::open(config.connection_url())
            .map_err(|e| KvError::Connection(e.to_string()))?;

        let conn = tokio::time::timeout(config.connect_timeout, client.get_tokio_connection_manager())
            .await
            .map_err(|_| KvError::Connection("connect timed out".to_string()))?
            .map_err(|e| KvError::Connection(e.to_string()))?;

        Ok(Self {
            conn,
            command_timeout: config.command_timeout,
        })
    }

    async fn timed<F, T>(&self, fut: F) -> Result<T, KvError>
    where
        F: std::future::Future<Output = redis::RedisResult<T>>,
    {
        tokio::time::timeout(self.command_timeout, fut)
            .await
            .map_err(|_| KvError::Timeout)?
            .map_err(|e| KvError::Command(e.to_string()))
    }

    /// Raw bytes GET. `Ok(None)` on miss — never an error.
    pub async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let mut conn = self.conn.clone();
        self.timed(conn.get(key)).await
    }

    /// SET with TTL (SETEX semantics).
    pub async fn set_bytes(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        self.timed(conn.set_ex(key, value, ttl.as_secs().max(1) as usize))
            .await
    }

    /// SETNX with TTL, atomically via `SET key value NX EX ttl`. Returns
    /// `true` if the key was newly set (lock/rate-limit acquired).
    pub async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> Result<bool, KvError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = self
            .timed(
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl.as_secs().max(1))
                    .query_async(&mut conn),
            )
            .await?;
        Ok(reply.is_some())
    }

    pub async fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        self.timed(conn.del(key)).await
    }

    /// Incremental SCAN + batched DEL for a glob pattern. Caller (the admin
    /// boundary) must ensure the pattern is namespace-scoped.
    pub async fn delete_by_pattern(&self, pattern: &str, batch_size: usize) -> Result<u64, KvError> {
        let mut conn = self.conn.clone();
        let mut deleted = 0u64;
        let mut batch = Vec::with_capacity(batch_size);

        let mut iter: redis::AsyncIter<String> = self
            .timed(async {
                conn.scan_match(pattern).await
            })
            .await?;

        while let Some(key) = iter.next().await {
            batch.push(key);
            if batch.len() >= batch_size {
                deleted += flush_delete_batch(&self.conn, &mut batch).await?;
            }
        }
        drop(iter);

        if !batch.is_empty() {
            deleted += flush_delete_batch(&self.conn, &mut batch).await?;
        }

        Ok(deleted)
    }

    /// `PING`, used by the health endpoint under a 3s sub-deadline.
    pub async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        tokio::time::timeout(Duration::from_secs(3), redis::cmd("PING").query_async::<_, String>(&mut conn))
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false)
    }
}

async fn flush_delete_batch(conn: &ConnectionManager, batch: &mut Vec<String>) -> Result<u64, KvError> {
    if batch.is_empty() {
        return Ok(0);
    }
    let mut conn = conn.clone();
    let n: u64 = conn
        .del(batch.as_slice())
        .await
        .map_err(|e| KvError::Command(e.to_string()))?;
    batch.clear();
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_url_with_password() {
        let cfg = RedisConfig {
            password: Some("secret".to_string()),
            ..Default::default()
        };
        assert_eq!(cfg.connection_url(), "redis://:secret@localhost:6379/0");
    }

    #[test]
    fn connection_url_without_password() {
        let cfg = RedisConfig::default();
        assert_eq!(cfg.connection_url(), "redis://localhost:6379/0");
    }
}
