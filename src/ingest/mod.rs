//! IngestPipeline: RSS fetch → dedupe → upsert → keyphrase
//! tagging → today's archive refresh, under the `fetcher` advisory lock.

pub mod feed;
pub mod keyphrase;

use std::collections::HashSet;
use std::time::Duration;

use sqlx::types::Uuid;

use crate::db::EntryStore;
use crate::error::ServiceError;
use crate::jobguard::JobGuard;
use crate::models::{Entry, Tag};
use crate::time::TimeProvider;

use feed::FeedItem;
use keyphrase::{KeyphraseClient, KeyphraseOutcome};

pub struct IngestConfig {
    pub feed_urls: Vec<String>,
    pub max_entries: usize,
    pub top_n: usize,
    pub min_interval: Duration,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub fetched: usize,
    pub upserted: usize,
    pub inserted: usize,
    pub tagged: usize,
    pub tagging_rate_limited: bool,
}

pub struct IngestPipeline {
    store: EntryStore,
    time: TimeProvider,
    http: reqwest::Client,
    config: IngestConfig,
    keyphrase: Option<KeyphraseClient>,
}

impl IngestPipeline {
    pub fn new(store: EntryStore, time: TimeProvider, http: reqwest::Client, config: IngestConfig, keyphrase: Option<KeyphraseClient>) -> Self {
        Self {
            store,
            time,
            http,
            config,
            keyphrase,
        }
    }

    /// Runs one ingest tick under the `fetcher` advisory lock. Returns
    /// `Ok(None)` if another process already holds the lock — the caller
    /// should log and exit 0, not treat this as a failure.
    pub async fn run_once(&self) -> Result<Option<IngestReport>, ServiceError> {
        let pool = self.store.pool().clone();
        let guard = JobGuard::try_acquire(&pool, "fetcher").await?;

        let Some(guard) = guard else {
            return Ok(None);
        };

        let result = self.run_locked().await;

        guard.release().await?;
        result.map(Some)
    }

    async fn run_locked(&self) -> Result<IngestReport, ServiceError> {
        let mut report = IngestReport::default();
        let items = self.fetch_all_items().await;

        let deduped = dedupe_by_url(items, self.config.max_entries);
        report.fetched = deduped.len();

        let now = self.time.now();
        for item in &deduped {
            let entry = build_entry(item, now);
            match self.store.upsert_by_url(&entry).await {
                Ok((_, inserted)) => {
                    report.upserted += 1;
                    if inserted {
                        report.inserted += 1;
                    }
                }
                Err(e) => tracing::warn!(url = %item.url, error = %e, "upsert failed, skipping item"),
            }
        }

        if let Some(client) = &self.keyphrase {
            report.tagging_rate_limited = !self.tag_untagged_entries(client, &mut report).await?;
        }

        let today = self.time.day_of(now);
        self.store.refresh_archive_counts_for_day(today).await?;

        Ok(report)
    }

    async fn fetch_all_items(&self) -> Vec<FeedItem> {
        let mut items = Vec::new();
        for url in &self.config.feed_urls {
            match feed::fetch_feed(&self.http, url).await {
                Ok(xml) => items.extend(feed::parse_items(&xml)),
                Err(e) => tracing::warn!(feed = %url, error = %e, "feed fetch failed, continuing with remaining feeds"),
            }
        }
        items
    }

    /// Returns `false` if the run stopped early due to a 429/rate-limit.
    async fn tag_untagged_entries(&self, client: &KeyphraseClient, report: &mut IngestReport) -> Result<bool, ServiceError> {
        let candidates = self.store.list_untagged(self.config.max_entries as i64).await?;
        let pool = self.store.pool();

        for entry in candidates {
            let input = format!("{}\n{}", entry.title, entry.excerpt.clone().unwrap_or_default());

            match client.extract(&input).await {
                Ok(KeyphraseOutcome::RateLimited) => return Ok(false),
                Ok(KeyphraseOutcome::Phrases(phrases)) => {
                    let scaled = keyphrase::normalize_and_scale(phrases, self.config.top_n);
                    for (name, score) in scaled {
                        if let Ok(tag_id) = upsert_tag(pool, &name).await {
                            let _ = insert_entry_tag(pool, entry.id, tag_id, score).await;
                        }
                    }
                    report.tagged += 1;
                }
                Err(e) => {
                    tracing::warn!(entry_id = %entry.id, error = %e, "keyphrase extraction failed, skipping entry");
                }
            }

            tokio::time::sleep(self.config.min_interval).await;
        }

        Ok(true)
    }
}

fn dedupe_by_url(items: Vec<FeedItem>, max_entries: usize) -> Vec<FeedItem> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for item in items {
        if seen.insert(item.url.clone()) {
            result.push(item);
            if result.len() >= max_entries {
                break;
            }
        }
    }
    result
}

fn build_entry(item: &FeedItem, now: chrono::DateTime<chrono::Utc>) -> Entry {
    let search_text = Entry::build_search_text(&item.title, item.excerpt.as_deref(), &item.url);
    Entry {
        id: Uuid::new_v4(),
        url: item.url.clone(),
        title: item.title.clone(),
        excerpt: item.excerpt.clone(),
        subject: item.subject.clone(),
        bookmark_count: item.bookmark_count,
        posted_at: item.posted_at,
        created_at: Entry::derive_created_at(item.posted_at, now),
        updated_at: now,
        search_text,
        tags: Vec::new(),
    }
}

async fn upsert_tag(pool: &sqlx::PgPool, name: &str) -> Result<Uuid, sqlx::Error> {
    let normalized = Tag::normalize_name(name);
    sqlx::query_scalar(
        r#"
        INSERT INTO tags (id, name) VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(normalized)
    .fetch_one(pool)
    .await
}

async fn insert_entry_tag(pool: &sqlx::PgPool, entry_id: Uuid, tag_id: Uuid, score: f64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO entry_tags (entry_id, tag_id, score) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING")
        .bind(entry_id)
        .bind(tag_id)
        .bind(score)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str) -> FeedItem {
        FeedItem {
            url: url.to_string(),
            title: "t".to_string(),
            excerpt: None,
            subject: None,
            posted_at: chrono::Utc::now(),
            bookmark_count: 0,
        }
    }

    #[test]
    fn dedupe_drops_repeated_urls() {
        let items = vec![item("https://a"), item("https://a"), item("https://b")];
        let deduped = dedupe_by_url(items, 10);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn dedupe_caps_at_max_entries() {
        let items = vec![item("https://a"), item("https://b"), item("https://c")];
        let deduped = dedupe_by_url(items, 2);
        assert_eq!(deduped.len(), 2);
    }
}
