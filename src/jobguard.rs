//! Postgres advisory locking.
//!
//! Keeps concurrent runs of the ingest/update/archive-rebuild jobs from
//! stepping on each other across process instances, backed by a real
//! `pg_try_advisory_lock` rather than a simulated leader table.

use sqlx::PgPool;

use crate::error::DbError;

/// Session-level advisory lock held for the lifetime of a job run.
pub struct JobGuard<'a> {
    pool: &'a PgPool,
    key: i64,
    name: &'static str,
}

impl<'a> JobGuard<'a> {
    /// Attempt to acquire the lock named `name`. Returns `None` if another
    /// process already holds it — callers should skip the run, not retry.
    pub async fn try_acquire(pool: &'a PgPool, name: &'static str) -> Result<Option<JobGuard<'a>>, DbError> {
        let key = fnv1a_64(name);
        let (acquired,): (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
            .bind(key)
            .fetch_one(pool)
            .await?;

        if acquired {
            Ok(Some(JobGuard { pool, key, name }))
        } else {
            Ok(None)
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn release(self) -> Result<(), DbError> {
        let released: bool = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
            .bind(self.key)
            .fetch_one(self.pool)
            .await?;

        if released {
            Ok(())
        } else {
            Err(DbError::Query(sqlx::Error::Protocol(format!(
                "advisory lock '{}' was not held at release time",
                self.name
            ))))
        }
    }
}

/// FNV-1a 64-bit hash, truncated to `i64` (Postgres advisory locks take a
/// signed bigint). Stable across process restarts so lock names round-trip.
fn fnv1a_64(name: &str) -> i64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for byte in name.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(fnv1a_64("fetcher"), fnv1a_64("fetcher"));
    }

    #[test]
    fn hash_differs_across_names() {
        assert_ne!(fnv1a_64("fetcher"), fnv1a_64("updater"));
    }
}
