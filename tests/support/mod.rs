//! Shared harness for the ignored, infra-backed integration tests under
//! `tests/`. Connects to the Postgres/Redis named by `POSTGRES_*`/`REDIS_*`
//! env vars (see [`hateblog::config::Config`]) and wires up the same
//! services `main.rs` constructs for `serve`.

#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use hateblog::cache::TypedCache;
use hateblog::config::Config;
use hateblog::db::{self, ConnectionPool, EntryStore};
use hateblog::kv::KVCache;
use hateblog::models::Entry;
use hateblog::services::entry::EntrySvc;
use hateblog::services::favicon::FaviconSvc;
use hateblog::services::search::{PgSearchHistoryRecorder, SearchSvc};
use hateblog::time::TimeProvider;

pub struct TestHarness {
    pub store: EntryStore,
    pub time: TimeProvider,
    pub kv: KVCache,
    pub entry_svc: EntrySvc,
    pub search_svc: SearchSvc,
}

impl TestHarness {
    pub async fn connect() -> Self {
        let config = Config::from_env().expect("test env must set POSTGRES_*/REDIS_* vars");
        let pool = ConnectionPool::connect(&config.database).await.expect("connect to test postgres");
        db::migrations::run(pool.inner()).await.expect("run migrations against test postgres");
        let kv = KVCache::connect(&config.redis).await.expect("connect to test redis");

        let store = EntryStore::new(pool.inner().clone());
        let time = TimeProvider::new(&config.timezone);

        let entry_svc = EntrySvc::new(
            store.clone(),
            time.clone(),
            TypedCache::new(kv.clone(), true),
            TypedCache::new(kv.clone(), true),
        );

        let search_svc = SearchSvc::new(
            store.clone(),
            TypedCache::new(kv.clone(), true),
            std::sync::Arc::new(PgSearchHistoryRecorder::new(pool.inner().clone())),
        );

        Self { store, time, kv, entry_svc, search_svc }
    }
}

/// Inserts an entry `posted_at` noon on `day` with the given bookmark count,
/// under a fresh random URL so repeated seeds never collide.
pub async fn seed_entry(store: &EntryStore, time: &TimeProvider, day: NaiveDate, bookmark_count: i64) -> Entry {
    let posted_at = time
        .day_range(day)
        .expect("valid day")
        .start
        + chrono::Duration::hours(12);

    let url = format!("https://example.test/{}", Uuid::new_v4());
    let title = format!("entry {bookmark_count}");
    let search_text = Entry::build_search_text(&title, None, &url);

    let entry = Entry {
        id: Uuid::new_v4(),
        url,
        title,
        excerpt: None,
        subject: None,
        bookmark_count,
        posted_at,
        created_at: Entry::derive_created_at(posted_at, Utc::now()),
        updated_at: Utc::now(),
        search_text,
        tags: Vec::new(),
    };

    let (id, _) = store.upsert_by_url(&entry).await.expect("seed entry upsert");
    store.get(id).await.expect("fetch seeded entry").expect("seeded entry exists")
}

pub async fn tag_entry(pool: &PgPool, entry_id: Uuid, tag_name: &str) {
    let tag_id: Uuid = sqlx::query_scalar(
        "INSERT INTO tags (id, name) VALUES ($1, $2) ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(tag_name)
    .fetch_one(pool)
    .await
    .expect("upsert tag");

    sqlx::query("INSERT INTO entry_tags (entry_id, tag_id, score) VALUES ($1, $2, 1.0) ON CONFLICT DO NOTHING")
        .bind(entry_id)
        .bind(tag_id)
        .execute(pool)
        .await
        .expect("insert entry_tags row");
}
