//! EntrySvc: day views and tag views over [`EntryStore`],
//! each backed by a whole-slab cache that absorbs every `(min_users, sort,
//! page)` combination behind one cache entry.

use crate::cache::{keys, ttl, CacheStatus, TypedCache};
use crate::db::{EntryStore, ListQuery};
use crate::error::ServiceError;
use crate::models::{Entry, SortOrder};
use crate::time::TimeProvider;

use super::{filter_sort_paginate, EntryListResult, Served};

#[derive(Clone)]
pub struct EntrySvc {
    store: EntryStore,
    time: TimeProvider,
    day_cache: TypedCache<Vec<Entry>>,
    tag_cache: TypedCache<Vec<Entry>>,
}

/// Tag slab is only used for the default page — the first, largest page of
/// a tag feed. Anything else falls through to a direct store query.
const TAG_SLAB_LIMIT: i64 = 100;
const TAG_SLAB_OFFSET: i64 = 0;

impl EntrySvc {
    pub fn new(store: EntryStore, time: TimeProvider, day_cache: TypedCache<Vec<Entry>>, tag_cache: TypedCache<Vec<Entry>>) -> Self {
        Self {
            store,
            time,
            day_cache,
            tag_cache,
        }
    }

    pub async fn list_new_entries(&self, date: &str, min_users: i64, limit: i64, offset: i64) -> Result<Served<EntryListResult>, ServiceError> {
        self.day_view(date, min_users, limit, offset, SortOrder::New).await
    }

    pub async fn list_hot_entries(&self, date: &str, min_users: i64, limit: i64, offset: i64) -> Result<Served<EntryListResult>, ServiceError> {
        self.day_view(date, min_users, limit, offset, SortOrder::Hot).await
    }

    async fn day_view(&self, date: &str, min_users: i64, limit: i64, offset: i64, sort: SortOrder) -> Result<Served<EntryListResult>, ServiceError> {
        let day = self.time.parse_day(date)?;
        let key = keys::day_entries(date);

        let (slab, status) = match self.day_cache.get(&key).await? {
            Some(slab) => (slab, CacheStatus::Hit),
            None => {
                let range = self.time.day_range(day)?;
                let query = ListQuery {
                    posted_at_from: Some(range.start),
                    posted_at_to: Some(range.end),
                    sort: SortOrder::New,
                    limit: ttl::DAY_SLAB_MAX_RESULTS,
                    max_limit_override: Some(ttl::DAY_SLAB_MAX_RESULTS),
                    ..Default::default()
                }
                .normalize();
                let slab = self.store.list(&query).await?;
                self.day_cache.set(&key, &slab, ttl::DAY_ENTRIES).await;
                (slab, CacheStatus::Miss)
            }
        };

        let result = filter_sort_paginate(slab, min_users, sort, limit, offset);
        Ok((result, status))
    }

    pub async fn list_tag_entries(&self, tag: &str, sort: SortOrder, min_users: i64, limit: i64, offset: i64) -> Result<Served<EntryListResult>, ServiceError> {
        if limit == TAG_SLAB_LIMIT && offset == TAG_SLAB_OFFSET {
            let key = keys::tag_entries_slab(tag, sort, min_users);

            let (slab, status) = match self.tag_cache.get(&key).await? {
                Some(slab) => (slab, CacheStatus::Hit),
                None => {
                    let query = ListQuery {
                        tags: vec![tag.to_string()],
                        min_bookmark_count: min_users,
                        sort,
                        limit: TAG_SLAB_LIMIT,
                        max_limit_override: Some(TAG_SLAB_LIMIT),
                        ..Default::default()
                    }
                    .normalize();
                    let slab = self.store.list(&query).await?;
                    self.tag_cache.set(&key, &slab, ttl::TAG_ENTRIES).await;
                    (slab, CacheStatus::Miss)
                }
            };

            let result = filter_sort_paginate(slab, min_users, sort, limit, offset);
            return Ok((result, status));
        }

        let query = ListQuery {
            tags: vec![tag.to_string()],
            min_bookmark_count: min_users,
            sort,
            limit,
            offset,
            max_limit_override: Some(TAG_SLAB_LIMIT),
            ..Default::default()
        }
        .normalize();

        let items = self.store.list(&query).await?;
        let total = self.store.count(&query).await?;
        Ok((EntryListResult { items, total }, CacheStatus::Miss))
    }
}
