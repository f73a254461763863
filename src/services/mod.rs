//! Use-case engines.
//!
//! Each service orchestrates cache-first lookup, canonical query planning
//! against [`crate::db::EntryStore`], and in-memory filter/sort/paginate —
//! a whole result slab cached once, pages carved out of it in memory.
//! Mirrors the enterprise-module shape of "service wraps store + cache,
//! returns a typed result plus a status", minus the simulated backends.

pub mod archive;
pub mod entry;
pub mod favicon;
pub mod metrics;
pub mod ranking;
pub mod search;
pub mod tag;

use serde::{Deserialize, Serialize};

use crate::cache::CacheStatus;
use crate::models::Entry;

/// Paginated list result returned by every list-shaped service method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// `(result, cache_hit)` pair, the contract every cache-aware service method
/// returns so the HTTP layer can set `X-Cache`.
pub type Served<T> = (T, CacheStatus);

pub type EntryListResult = ListResult<Entry>;

/// Filters entries by `bookmark_count >= min_users`, applies the requested
/// sort, and slices `[offset, offset+limit)` — the in-memory half of every
/// slab-backed list method.
pub fn filter_sort_paginate(
    mut entries: Vec<Entry>,
    min_users: i64,
    sort: crate::models::SortOrder,
    limit: i64,
    offset: i64,
) -> EntryListResult {
    entries.retain(|e| e.bookmark_count >= min_users);

    match sort {
        crate::models::SortOrder::New => entries.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        crate::models::SortOrder::Hot => entries.sort_by(|a, b| {
            b.bookmark_count
                .cmp(&a.bookmark_count)
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
    }

    let total = entries.len() as i64;
    let start = offset.max(0) as usize;
    let end = (start + limit.max(0) as usize).min(entries.len());
    let items = if start >= entries.len() {
        Vec::new()
    } else {
        entries[start..end].to_vec()
    };

    ListResult { items, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortOrder;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(count: i64, created_offset_secs: i64) -> Entry {
        let now = Utc::now();
        Entry {
            id: Uuid::new_v4(),
            url: format!("https://example.com/{count}"),
            title: "t".to_string(),
            excerpt: None,
            subject: None,
            bookmark_count: count,
            posted_at: now,
            created_at: now + chrono::Duration::seconds(created_offset_secs),
            updated_at: now,
            search_text: String::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn hot_sort_ties_break_on_created_at_desc() {
        let entries = vec![entry(30, 0), entry(30, 10), entry(10, 20)];
        let result = filter_sort_paginate(entries, 0, SortOrder::Hot, 10, 0);
        assert_eq!(result.items[0].bookmark_count, 30);
        assert_eq!(result.items[1].bookmark_count, 30);
        assert!(result.items[0].created_at > result.items[1].created_at);
    }

    #[test]
    fn min_users_filters_before_pagination() {
        let entries = vec![entry(10, 0), entry(20, 0), entry(30, 0)];
        let result = filter_sort_paginate(entries, 15, SortOrder::Hot, 10, 0);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn offset_beyond_len_yields_empty() {
        let entries = vec![entry(10, 0)];
        let result = filter_sort_paginate(entries, 0, SortOrder::New, 10, 5);
        assert!(result.items.is_empty());
        assert_eq!(result.total, 1);
    }
}
