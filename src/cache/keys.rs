//! Deterministic cache key builders. Every key is built from the full
//! parameter tuple so distinct filters never collide; user text (search
//! queries) is hashed with SHA-256 rather than embedded raw.

use sha2::{Digest, Sha256};

use crate::models::SortOrder;

fn sort_tag(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::New => "new",
        SortOrder::Hot => "hot",
    }
}

pub fn day_entries(date: &str) -> String {
    format!("hateblog:entries:{date}:all")
}

pub fn tag_entries_slab(tag: &str, sort: SortOrder, min_users: i64) -> String {
    format!("hateblog:tags:{tag}:entries:{}:{min_users}:100:0", sort_tag(sort))
}

pub fn search_hash(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn search_result(query: &str, sort: SortOrder, min_users: i64, limit: i64, offset: i64) -> String {
    format!(
        "hateblog:search:{}:{}:{min_users}:{limit}:{offset}",
        search_hash(query),
        sort_tag(sort)
    )
}

pub fn tags_list(limit: i64, offset: i64) -> String {
    format!("hateblog:tags:list:{limit}:{offset}")
}

pub fn archive_today(min_users: i64) -> String {
    format!("hateblog:archive:today:{min_users}")
}

pub fn archive_past(min_users: i64) -> String {
    format!("hateblog:archive:past:{min_users}")
}

pub fn rankings_yearly(year: i32, min_users: i64) -> String {
    format!("hateblog:rankings:yearly:{year}:{min_users}")
}

pub fn rankings_monthly(year: i32, month: u32, min_users: i64) -> String {
    format!("hateblog:rankings:monthly:{year}:{month}:{min_users}")
}

pub fn rankings_weekly(year: i32, week: u32, min_users: i64) -> String {
    format!("hateblog:rankings:weekly:{year}:{week}:{min_users}")
}

pub fn favicon_binary(host: &str) -> String {
    format!("favicon:{host}")
}

pub fn favicon_negative(host: &str) -> String {
    format!("favicon:{host}:negative")
}

pub fn favicon_rate_limit(host: &str) -> String {
    format!("favicon:ratelimit:{host}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_hash_is_stable() {
        assert_eq!(search_hash("rust async"), search_hash("rust async"));
        assert_ne!(search_hash("rust"), search_hash("golang"));
    }

    #[test]
    fn distinct_params_produce_distinct_keys() {
        let a = tag_entries_slab("go", SortOrder::New, 0);
        let b = tag_entries_slab("go", SortOrder::Hot, 0);
        assert_ne!(a, b);
    }
}
