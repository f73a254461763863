//! End-to-end scenario 7: ingest idempotence. Exercises the
//! upsert-by-url + archive-refresh primitives `IngestPipeline` drives,
//! without depending on a live RSS endpoint — the network fetch itself is
//! a thin `reqwest` call already covered by `ingest::feed` unit tests.
//! Requires a disposable Postgres reachable via `POSTGRES_*`; run with
//! `cargo test --test ingest_idempotence_test -- --ignored`.

mod support;

use chrono::Utc;
use uuid::Uuid;

use hateblog::models::Entry;
use support::TestHarness;

fn feed_derived_entry(url: &str, bookmark_count: i64) -> Entry {
    let now = Utc::now();
    let posted_at = now - chrono::Duration::hours(48);
    let title = "Idempotence fixture".to_string();
    let search_text = Entry::build_search_text(&title, None, url);

    Entry {
        id: Uuid::new_v4(),
        url: url.to_string(),
        title,
        excerpt: None,
        subject: None,
        bookmark_count,
        posted_at,
        created_at: Entry::derive_created_at(posted_at, now),
        updated_at: now,
        search_text,
        tags: Vec::new(),
    }
}

#[tokio::test]
#[ignore]
async fn upserting_the_same_url_twice_yields_one_row() {
    let harness = TestHarness::connect().await;
    let url = format!("https://example.test/idempotence/{}", Uuid::new_v4());

    let (first_id, first_inserted) = harness.store.upsert_by_url(&feed_derived_entry(&url, 10)).await.unwrap();
    assert!(first_inserted);

    let (second_id, second_inserted) = harness.store.upsert_by_url(&feed_derived_entry(&url, 25)).await.unwrap();
    assert_eq!(first_id, second_id);
    assert!(!second_inserted);

    let entry = harness.store.get(second_id).await.unwrap().unwrap();
    assert_eq!(entry.bookmark_count, 25);
}

#[tokio::test]
#[ignore]
async fn refresh_archive_counts_for_day_is_idempotent() {
    let harness = TestHarness::connect().await;
    let day = chrono::NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();

    support::seed_entry(&harness.store, &harness.time, day, 7).await;
    support::seed_entry(&harness.store, &harness.time, day, 12).await;

    harness.store.refresh_archive_counts_for_day(day).await.unwrap();
    let first = harness.store.list_archive_counts(0).await.unwrap();

    harness.store.refresh_archive_counts_for_day(day).await.unwrap();
    let second = harness.store.list_archive_counts(0).await.unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.day, b.day);
        assert_eq!(a.bookmark_count, b.bookmark_count);
        assert_eq!(a.count, b.count);
    }
}
