//! End-to-end scenarios 4-6: search cache + fire-and-forget history,
//! favicon negative cache, and favicon rate-limiting. Requires a
//! disposable Postgres + Redis reachable via `POSTGRES_*`/`REDIS_*`; run
//! with `cargo test --test search_and_favicon_scenarios_test -- --ignored`.

mod support;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use hateblog::cache::{CacheStatus, NegativeCache, RateLimitGate, TypedCache};
use hateblog::error::ServiceError;
use hateblog::services::favicon::{FaviconFetcher, FaviconPayload, FaviconSvc};
use hateblog::services::search::SearchHistoryRecorder;
use support::{seed_entry, TestHarness};

struct AlwaysFailingRecorder;

#[async_trait]
impl SearchHistoryRecorder for AlwaysFailingRecorder {
    async fn record(&self, _query: &str) -> Result<(), ServiceError> {
        Err(ServiceError::DependencyUnavailable("history store down".to_string()))
    }
}

#[tokio::test]
#[ignore]
async fn search_succeeds_and_caches_even_when_history_recording_fails() {
    let harness = TestHarness::connect().await;
    let day = chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    seed_entry(&harness.store, &harness.time, day, 5).await;

    let search_svc = hateblog::services::search::SearchSvc::new(
        harness.store.clone(),
        TypedCache::new(harness.kv.clone(), true),
        Arc::new(AlwaysFailingRecorder),
    );

    let (_, status) = search_svc.search("entry", Some(25), Some(0), None, None).await.unwrap();
    assert_eq!(status, CacheStatus::Miss);

    let (_, status) = search_svc.search("entry", Some(25), Some(0), None, None).await.unwrap();
    assert_eq!(status, CacheStatus::Hit);
}

#[tokio::test]
#[ignore]
async fn search_rejects_a_blank_query() {
    let harness = TestHarness::connect().await;
    let result = harness.search_svc.search("   ", None, None, None, None).await;
    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
}

#[tokio::test]
#[ignore]
async fn search_rejects_a_query_over_the_length_limit() {
    let harness = TestHarness::connect().await;
    let overlong = "a".repeat(501);
    let result = harness.search_svc.search(&overlong, None, None, None, None).await;
    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
}

#[tokio::test]
#[ignore]
async fn search_trims_surrounding_whitespace_before_matching() {
    let harness = TestHarness::connect().await;
    let day = chrono::NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
    seed_entry(&harness.store, &harness.time, day, 5).await;

    let (padded, _) = harness.search_svc.search("  entry  ", Some(25), Some(0), None, None).await.unwrap();
    let (trimmed, _) = harness.search_svc.search("entry", Some(25), Some(0), None, None).await.unwrap();
    assert_eq!(padded.total, trimmed.total);
}

struct FlakyOnceFetcher {
    failed_once: std::sync::Mutex<bool>,
}

#[async_trait]
impl FaviconFetcher for FlakyOnceFetcher {
    async fn fetch(&self, _host: &str) -> Result<FaviconPayload, ServiceError> {
        let mut failed = self.failed_once.lock().unwrap();
        if !*failed {
            *failed = true;
            Err(ServiceError::DependencyUnavailable("upstream unreachable".to_string()))
        } else {
            panic!("fetcher should not be called again while the negative cache is warm");
        }
    }
}

#[tokio::test]
#[ignore]
async fn favicon_negative_cache_suppresses_repeat_fetches() {
    let harness = TestHarness::connect().await;
    let fetcher = Arc::new(FlakyOnceFetcher { failed_once: std::sync::Mutex::new(false) });

    let svc = FaviconSvc::new(
        fetcher,
        TypedCache::new(harness.kv.clone(), true),
        NegativeCache::new(harness.kv.clone()),
        RateLimitGate::new(harness.kv.clone()),
        Duration::from_secs(3600),
        Duration::from_secs(300),
        Duration::from_secs(60),
    );

    let (first, status) = svc.get("negative-cache-scenario.example").await.unwrap();
    assert!(first.bytes.len() > 0);
    assert_eq!(status, CacheStatus::Miss);

    let (second, status) = svc.get("negative-cache-scenario.example").await.unwrap();
    assert_eq!(second.bytes, first.bytes);
    assert_eq!(status, CacheStatus::Hit);
}

struct CountingFetcher {
    calls: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl FaviconFetcher for CountingFetcher {
    async fn fetch(&self, _host: &str) -> Result<FaviconPayload, ServiceError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(FaviconPayload { bytes: vec![1, 2, 3], content_type: "image/png".to_string() })
    }
}

#[tokio::test]
#[ignore]
async fn second_favicon_request_in_window_is_rate_limited_without_an_external_call() {
    let harness = TestHarness::connect().await;
    let fetcher = Arc::new(CountingFetcher { calls: std::sync::atomic::AtomicUsize::new(0) });

    // A fresh, uncached positive/negative state: use a host unique to this run.
    let host = format!("rate-limit-scenario-{}.example", uuid::Uuid::new_v4());

    let svc = FaviconSvc::new(
        fetcher.clone(),
        TypedCache::new(harness.kv.clone(), true),
        NegativeCache::new(harness.kv.clone()),
        RateLimitGate::new(harness.kv.clone()),
        // Disable the positive cache's effect on this test by keeping it
        // short; the rate-limit gate is what's under test here.
        Duration::from_millis(1),
        Duration::from_millis(1),
        Duration::from_secs(60),
    );

    let (_, _) = svc.get(&host).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let result = svc.get(&host).await;
    assert!(matches!(result, Err(ServiceError::RateLimited)));
    assert_eq!(fetcher.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}
