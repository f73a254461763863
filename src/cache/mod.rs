//! Typed cache layer.
//!
//! Each cache is `(KVCache, ttl_policy, key_builder, codec)`; this module
//! supplies a small generic wrapper (`TypedCache`) plus the key builders
//! and TTL table, so the query services never touch raw bytes or Redis
//! key strings directly — the same separation between the raw byte store
//! and its higher-level cache callers kept throughout this codebase.

pub mod keys;
pub mod ttl;

use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ServiceError;
use crate::kv::{codec, KVCache};

/// Outcome of a cache-aware lookup, carried up to the HTTP layer as the
/// `X-Cache` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn header_value(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// A typed view over [`KVCache`] for one cache entity. Generic over the
/// payload type; key construction stays with the caller ([`keys`]).
#[derive(Clone)]
pub struct TypedCache<T> {
    kv: KVCache,
    enabled: bool,
    _marker: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> TypedCache<T> {
    pub fn new(kv: KVCache, enabled: bool) -> Self {
        Self {
            kv,
            enabled,
            _marker: PhantomData,
        }
    }

    /// `Ok(None)` on miss, KV error, or when caching is globally disabled.
    /// KV errors never surface to the caller — they're recovered locally
    /// and logged; only codec corruption is.
    pub async fn get(&self, key: &str) -> Result<Option<T>, ServiceError> {
        if !self.enabled {
            return Ok(None);
        }
        match self.kv.get_bytes(key).await {
            Ok(Some(bytes)) => match codec::decode::<T>(&bytes) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    tracing::warn!(key, error = %e, "cache payload decode failed, treating as miss");
                    Ok(None)
                }
            },
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::debug!(key, error = %e, "cache get failed, falling through to store");
                Ok(None)
            }
        }
    }

    pub async fn set(&self, key: &str, value: &T, ttl: Duration) {
        if !self.enabled {
            return;
        }
        match codec::encode(value) {
            Ok(bytes) => {
                if let Err(e) = self.kv.set_bytes(key, &bytes, ttl).await {
                    tracing::warn!(key, error = %e, "cache set failed");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "cache payload encode failed"),
        }
    }
}

/// Negative-cache marker: presence alone is the signal, no payload needed.
#[derive(Clone)]
pub struct NegativeCache {
    kv: KVCache,
}

impl NegativeCache {
    pub fn new(kv: KVCache) -> Self {
        Self { kv }
    }

    pub async fn is_marked(&self, key: &str) -> bool {
        matches!(self.kv.get_bytes(key).await, Ok(Some(_)))
    }

    pub async fn mark(&self, key: &str, ttl: Duration) {
        if let Err(e) = self.kv.set_bytes(key, b"1", ttl).await {
            tracing::warn!(key, error = %e, "negative cache mark failed");
        }
    }
}

/// `SETNX`-backed rate limiter window keyed by host.
#[derive(Clone)]
pub struct RateLimitGate {
    kv: KVCache,
}

impl RateLimitGate {
    pub fn new(kv: KVCache) -> Self {
        Self { kv }
    }

    /// Returns `true` if the caller may proceed (window was free).
    pub async fn try_enter(&self, key: &str, window: Duration) -> bool {
        match self.kv.set_if_absent(key, b"1", window).await {
            Ok(acquired) => acquired,
            Err(e) => {
                tracing::warn!(key, error = %e, "rate-limit gate check failed, failing open");
                true
            }
        }
    }
}

/// Admin pattern-purge. Refuses anything not namespaced under `hateblog:`.
pub async fn purge_pattern(kv: &KVCache, pattern: &str, batch_size: usize) -> Result<u64, ServiceError> {
    if !pattern.starts_with("hateblog:") {
        return Err(ServiceError::InvalidArgument(
            "purge pattern must start with hateblog:".to_string(),
        ));
    }
    kv.delete_by_pattern(pattern, batch_size)
        .await
        .map_err(ServiceError::from)
}
