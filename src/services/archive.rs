//! ArchiveSvc: dense per-day bookmark-count histogram, partitioned
//! into "today" (rapid churn) and "past" (large, stable) cache entries so
//! today's refresh never invalidates the historical slab.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cache::{keys, CacheStatus, TypedCache};
use crate::db::EntryStore;
use crate::error::ServiceError;
use crate::time::TimeProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveDayCount {
    pub day: NaiveDate,
    pub count: i64,
}

#[derive(Clone)]
pub struct ArchiveSvc {
    store: EntryStore,
    time: TimeProvider,
    today_cache: TypedCache<Vec<ArchiveDayCount>>,
    past_cache: TypedCache<Vec<ArchiveDayCount>>,
    ttl_today: Duration,
    ttl_past: Duration,
}

impl ArchiveSvc {
    pub fn new(
        store: EntryStore,
        time: TimeProvider,
        today_cache: TypedCache<Vec<ArchiveDayCount>>,
        past_cache: TypedCache<Vec<ArchiveDayCount>>,
        ttl_today: Option<Duration>,
        ttl_past: Option<Duration>,
        ttl_default: Duration,
    ) -> Self {
        Self {
            store,
            time,
            today_cache,
            past_cache,
            ttl_today: ttl_today.unwrap_or(ttl_default),
            ttl_past: ttl_past.unwrap_or(ttl_default),
        }
    }

    pub async fn list(&self, min_users: i64) -> Result<(Vec<ArchiveDayCount>, CacheStatus), ServiceError> {
        let today = self.time.day_of(self.time.now());
        let key_today = keys::archive_today(min_users);
        let key_past = keys::archive_past(min_users);

        let cached_today = self.today_cache.get(&key_today).await?;
        let cached_past = self.past_cache.get(&key_past).await?;

        if let (Some(today_rows), Some(past_rows)) = (&cached_today, &cached_past) {
            let mut merged = past_rows.clone();
            merged.extend(today_rows.clone());
            merged.sort_by_key(|r| r.day);
            return Ok((merged, CacheStatus::Hit));
        }

        let rows = self.store.list_archive_counts(min_users).await?;
        let by_day = aggregate_by_day(rows);

        let today_rows: Vec<ArchiveDayCount> = by_day.iter().filter(|r| r.day == today).cloned().collect();
        let past_rows: Vec<ArchiveDayCount> = by_day.iter().filter(|r| r.day != today).cloned().collect();

        self.today_cache.set(&key_today, &today_rows, self.ttl_today).await;
        self.past_cache.set(&key_past, &past_rows, self.ttl_past).await;

        let mut merged = past_rows;
        merged.extend(today_rows);
        merged.sort_by_key(|r| r.day);

        Ok((merged, CacheStatus::Miss))
    }
}

fn aggregate_by_day(rows: Vec<crate::models::ArchiveCount>) -> Vec<ArchiveDayCount> {
    let mut totals: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.day).or_insert(0) += row.count;
    }
    totals.into_iter().map(|(day, count)| ArchiveDayCount { day, count }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArchiveCount;

    #[test]
    fn aggregate_sums_per_day_across_bookmark_buckets() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let rows = vec![
            ArchiveCount { day: d, bookmark_count: 10, count: 2 },
            ArchiveCount { day: d, bookmark_count: 20, count: 3 },
        ];
        let result = aggregate_by_day(rows);
        assert_eq!(result, vec![ArchiveDayCount { day: d, count: 5 }]);
    }
}
