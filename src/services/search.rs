//! SearchSvc: validated substring search over the denormalized
//! `search_text` column, cache-first, with fire-and-forget history.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::cache::{keys, ttl, CacheStatus, TypedCache};
use crate::db::{EntryStore, ListQuery};
use crate::error::ServiceError;
use crate::models::SortOrder;

use super::{EntryListResult, Served};

const MAX_QUERY_LEN: usize = 500;
const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// Recording search history must never fail the search itself; this seam
/// lets tests inject a recorder that always errors.
#[async_trait]
pub trait SearchHistoryRecorder: Send + Sync {
    async fn record(&self, query: &str) -> Result<(), ServiceError>;
}

/// Appends to `search_history`, the append-only popularity-signal table.
pub struct PgSearchHistoryRecorder {
    pool: PgPool,
}

impl PgSearchHistoryRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchHistoryRecorder for PgSearchHistoryRecorder {
    async fn record(&self, query: &str) -> Result<(), ServiceError> {
        sqlx::query("INSERT INTO search_history (query, searched_at) VALUES ($1, $2)")
            .bind(query)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| ServiceError::DependencyUnavailable(e.to_string()))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SearchSvc {
    store: EntryStore,
    cache: TypedCache<EntryListResult>,
    history: std::sync::Arc<dyn SearchHistoryRecorder>,
}

impl SearchSvc {
    pub fn new(store: EntryStore, cache: TypedCache<EntryListResult>, history: std::sync::Arc<dyn SearchHistoryRecorder>) -> Self {
        Self { store, cache, history }
    }

    pub async fn search(
        &self,
        q: &str,
        limit: Option<i64>,
        offset: Option<i64>,
        min_users: Option<i64>,
        sort: Option<SortOrder>,
    ) -> Result<Served<EntryListResult>, ServiceError> {
        let q = q.trim();
        if q.is_empty() {
            return Err(ServiceError::InvalidArgument("q is required".to_string()));
        }
        if q.chars().count() > MAX_QUERY_LEN {
            return Err(ServiceError::InvalidArgument(format!(
                "q must be at most {MAX_QUERY_LEN} characters"
            )));
        }

        let min_users = min_users.unwrap_or(0);
        if min_users < 0 {
            return Err(ServiceError::InvalidArgument("min_users must be >= 0".to_string()));
        }

        let mut limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit <= 0 {
            limit = DEFAULT_LIMIT;
        }
        if limit > MAX_LIMIT {
            limit = MAX_LIMIT;
        }
        let offset = offset.unwrap_or(0).max(0);
        let sort = sort.unwrap_or(SortOrder::Hot);

        let key = keys::search_result(q, sort, min_users, limit, offset);

        let served = match self.cache.get(&key).await? {
            Some(result) => (result, CacheStatus::Hit),
            None => {
                let query = ListQuery {
                    keyword: Some(q.to_string()),
                    min_bookmark_count: min_users,
                    sort,
                    limit,
                    offset,
                    ..Default::default()
                }
                .normalize();

                let items = self.store.list(&query).await?;
                let total = self.store.count(&query).await?;
                let result = EntryListResult { items, total };
                self.cache.set(&key, &result, ttl::SEARCH_RESULT).await;
                (result, CacheStatus::Miss)
            }
        };

        if let Err(e) = self.history.record(q).await {
            tracing::warn!(error = %e, "search history recording failed");
        }

        Ok(served)
    }
}
