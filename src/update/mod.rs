//! UpdatePipeline: tiered bookmark-count refresh plus
//! `http://`→`https://` canonicalization, under a per-tier advisory lock.

pub mod bookmark_api;

use crate::db::EntryStore;
use crate::error::ServiceError;
use crate::jobguard::JobGuard;
use crate::time::TimeProvider;

use bookmark_api::BookmarkCountClient;

/// Partitions update targets by recency/popularity so a single tick bounds
/// its external API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    High,
    Low,
}

impl Tier {
    pub fn lock_name(self) -> &'static str {
        match self {
            Tier::High => "updater-high",
            Tier::Low => "updater-low",
        }
    }

    fn sql_predicate(self) -> &'static str {
        match self {
            Tier::High => "posted_at > now() - interval '30 days' OR bookmark_count >= 100",
            Tier::Low => "posted_at <= now() - interval '30 days' AND bookmark_count < 100",
        }
    }
}

#[derive(Debug, Default)]
pub struct UpdateReport {
    pub updated: usize,
    pub missing: usize,
    pub canonicalized: usize,
}

pub struct UpdatePipeline {
    store: EntryStore,
    time: TimeProvider,
    client: BookmarkCountClient,
    batch_size: i64,
    canonicalize_scheme: bool,
}

impl UpdatePipeline {
    pub fn new(store: EntryStore, time: TimeProvider, client: BookmarkCountClient, batch_size: i64, canonicalize_scheme: bool) -> Self {
        Self {
            store,
            time,
            client,
            batch_size,
            canonicalize_scheme,
        }
    }

    /// Runs one update tick for `tier`, under the tier's advisory lock.
    /// `Ok(None)` means another process already holds the lock.
    pub async fn run_once(&self, tier: Tier) -> Result<Option<UpdateReport>, ServiceError> {
        let pool = self.store.pool().clone();
        let guard = JobGuard::try_acquire(&pool, tier.lock_name()).await?;

        let Some(guard) = guard else {
            return Ok(None);
        };

        let result = self.run_locked(tier).await;

        guard.release().await?;
        result.map(Some)
    }

    async fn run_locked(&self, tier: Tier) -> Result<UpdateReport, ServiceError> {
        let mut report = UpdateReport::default();
        let targets = self.store.urls_for_update(tier.sql_predicate(), self.batch_size).await?;

        for chunk in targets.chunks(self.client.max_urls_per_call()) {
            let urls: Vec<String> = chunk.iter().map(|(_, url)| url.clone()).collect();
            let counts = match self.client.fetch_counts(&urls).await {
                Ok(counts) => counts,
                Err(ServiceError::RateLimited) => {
                    tracing::warn!(tier = ?tier, "bookmark count API rate limited, stopping this tick");
                    break;
                }
                Err(e) => return Err(e),
            };

            let now = self.time.now();
            for (id, url) in chunk {
                let count = counts.get(url).copied().flatten();
                let rows = self.store.update_bookmark_count(*id, count, now).await?;
                if rows > 0 && count.is_some() {
                    report.updated += 1;
                } else if count.is_none() {
                    report.missing += 1;
                }
            }
        }

        if self.canonicalize_scheme {
            report.canonicalized = self.canonicalize_http_entries(&targets).await?;
        }

        Ok(report)
    }

    /// For each `http://` URL among the tier's targets, check whether an
    /// `https://` row already exists and merge into it.
    async fn canonicalize_http_entries(&self, targets: &[(sqlx::types::Uuid, String)]) -> Result<usize, ServiceError> {
        let mut merged = 0;
        let now = self.time.now();

        for (id, url) in targets {
            let Some(rest) = url.strip_prefix("http://") else {
                continue;
            };
            let https_url = format!("https://{rest}");

            if let Some(https_entry) = self.store.find_by_url(&https_url).await? {
                if let Some(http_entry) = self.store.find_by_url(url).await? {
                    let merged_count = http_entry.bookmark_count.max(https_entry.bookmark_count);
                    self.store
                        .merge_scheme_entries(https_entry.id, http_entry.id, merged_count, now)
                        .await?;
                    merged += 1;
                }
            }
            let _ = id;
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_predicates_partition_by_recency_or_popularity() {
        assert!(Tier::High.sql_predicate().contains("bookmark_count >= 100"));
        assert!(Tier::Low.sql_predicate().contains("bookmark_count < 100"));
    }

    #[test]
    fn lock_names_are_distinct_per_tier() {
        assert_ne!(Tier::High.lock_name(), Tier::Low.lock_name());
    }
}
