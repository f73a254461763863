//! End-to-end scenarios 1-3: day-new pagination, day-hot sort +
//! min-users, tag slab reuse. Requires a disposable Postgres + Redis
//! reachable via `POSTGRES_*` / `REDIS_*` env vars; run with
//! `cargo test --test entry_and_tag_scenarios_test -- --ignored`.

mod support;

use hateblog::cache::CacheStatus;
use hateblog::models::SortOrder;
use support::{seed_entry, TestHarness};

#[tokio::test]
#[ignore]
async fn day_new_pagination_reports_cache_status_and_total() {
    let harness = TestHarness::connect().await;
    let day = chrono::NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();

    for count in [10, 20, 30] {
        seed_entry(&harness.store, &harness.time, day, count).await;
    }

    let (first, status) = harness.entry_svc.list_new_entries("20250105", 0, 2, 0).await.unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.total, 3);
    assert_eq!(status, CacheStatus::Miss);

    let (second, status) = harness.entry_svc.list_new_entries("20250105", 0, 2, 0).await.unwrap();
    assert_eq!(second.items.len(), 2);
    assert_eq!(status, CacheStatus::Hit);
}

#[tokio::test]
#[ignore]
async fn day_hot_sort_applies_min_users_filter() {
    let harness = TestHarness::connect().await;
    let day = chrono::NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

    for count in [10, 20, 30] {
        seed_entry(&harness.store, &harness.time, day, count).await;
    }

    let (result, _) = harness.entry_svc.list_hot_entries("20250106", 15, 10, 0).await.unwrap();
    assert_eq!(result.total, 2);
    assert_eq!(result.items[0].bookmark_count, 30);
    assert_eq!(result.items[1].bookmark_count, 20);
}

#[tokio::test]
#[ignore]
async fn tag_slab_is_only_reused_for_the_default_page() {
    let harness = TestHarness::connect().await;
    let day = chrono::NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();

    for i in 0..5 {
        let entry = seed_entry(&harness.store, &harness.time, day, 10 + i).await;
        support::tag_entry(&harness.store.pool(), entry.id, "go").await;
    }

    let (_, status) = harness
        .entry_svc
        .list_tag_entries("go", SortOrder::New, 0, 100, 0)
        .await
        .unwrap();
    assert_eq!(status, CacheStatus::Miss);

    let (_, status) = harness
        .entry_svc
        .list_tag_entries("go", SortOrder::New, 0, 100, 0)
        .await
        .unwrap();
    assert_eq!(status, CacheStatus::Hit);

    // A non-default page never consults the slab cache.
    let (paged, _) = harness
        .entry_svc
        .list_tag_entries("go", SortOrder::New, 0, 5, 0)
        .await
        .unwrap();
    assert_eq!(paged.items.len(), 5);
}
