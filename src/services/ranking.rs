//! RankingSvc: top-N bookmark-count rankings per yearly/monthly/
//! weekly period, cached as a single `(top_max, count)` slab per period.

use crate::cache::{keys, ttl, CacheStatus, TypedCache};
use crate::db::{EntryStore, ListQuery};
use crate::error::ServiceError;
use crate::models::SortOrder;
use crate::time::{Range, TimeProvider};

use super::{EntryListResult, Served};

#[derive(Clone)]
pub struct RankingSvc {
    store: EntryStore,
    time: TimeProvider,
    cache: TypedCache<EntryListResult>,
}

impl RankingSvc {
    pub fn new(store: EntryStore, time: TimeProvider, cache: TypedCache<EntryListResult>) -> Self {
        Self { store, time, cache }
    }

    pub async fn yearly(&self, year: i32, min_users: i64, limit: i64, offset: i64) -> Result<Served<EntryListResult>, ServiceError> {
        let range = self.time.year_range(year)?;
        let key = keys::rankings_yearly(year, min_users);
        self.period_view(range, key, ttl::RANKING_MAX_YEARLY, ttl::RANKING_YEARLY_CURRENT, ttl::RANKING_YEARLY_PAST, min_users, limit, offset)
            .await
    }

    pub async fn monthly(&self, year: i32, month: u32, min_users: i64, limit: i64, offset: i64) -> Result<Served<EntryListResult>, ServiceError> {
        let range = self.time.month_range(year, month)?;
        let key = keys::rankings_monthly(year, month, min_users);
        self.period_view(range, key, ttl::RANKING_MAX_MONTHLY, ttl::RANKING_MONTHLY_CURRENT, ttl::RANKING_MONTHLY_PAST, min_users, limit, offset)
            .await
    }

    pub async fn weekly(&self, year: i32, week: u32, min_users: i64, limit: i64, offset: i64) -> Result<Served<EntryListResult>, ServiceError> {
        let range = self.time.iso_week_range(year, week)?;
        let key = keys::rankings_weekly(year, week, min_users);
        self.period_view(range, key, ttl::RANKING_MAX_WEEKLY, ttl::RANKING_WEEKLY_CURRENT, ttl::RANKING_WEEKLY_PAST, min_users, limit, offset)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn period_view(
        &self,
        range: Range,
        key: String,
        max: i64,
        ttl_current: std::time::Duration,
        ttl_past: std::time::Duration,
        min_users: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Served<EntryListResult>, ServiceError> {
        let use_slab = limit == max && offset == 0;

        if use_slab {
            if let Some(cached) = self.cache.get(&key).await? {
                return Ok((cached, CacheStatus::Hit));
            }

            let query = ListQuery {
                posted_at_from: Some(range.start),
                posted_at_to: Some(range.end),
                min_bookmark_count: min_users,
                sort: SortOrder::Hot,
                limit: max,
                max_limit_override: Some(max),
                ..Default::default()
            }
            .normalize();

            let items = self.store.list(&query).await?;
            let total = self.store.count(&query).await?;
            let result = EntryListResult { items, total };

            let ttl = if self.time.is_current(&range) { ttl_current } else { ttl_past };
            self.cache.set(&key, &result, ttl).await;

            return Ok((result, CacheStatus::Miss));
        }

        let query = ListQuery {
            posted_at_from: Some(range.start),
            posted_at_to: Some(range.end),
            min_bookmark_count: min_users,
            sort: SortOrder::Hot,
            limit,
            offset,
            max_limit_override: Some(max),
            ..Default::default()
        }
        .normalize();

        let items = self.store.list(&query).await?;
        let total = self.store.count(&query).await?;
        Ok((EntryListResult { items, total }, CacheStatus::Miss))
    }
}
