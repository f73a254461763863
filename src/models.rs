//! Data model. Types cached as JSON carry `Serialize`/`Deserialize`; rows
//! read straight off the relational store carry `sqlx::FromRow`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Entry {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub subject: Option<String>,
    pub bookmark_count: i64,
    pub posted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub search_text: String,
    /// Populated by `EntryStore` via a join; absent on the raw row fetch.
    #[sqlx(default)]
    #[serde(default)]
    pub tags: Vec<Tagging>,
}

impl Entry {
    /// `created_at` uses the 24-hour rule: if the post is already more than
    /// a day old when ingested, keep its original `posted_at` as
    /// `created_at`; otherwise it's "new" as of now.
    pub fn derive_created_at(posted_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        if now.signed_duration_since(posted_at) >= chrono::Duration::hours(24) {
            posted_at
        } else {
            now
        }
    }

    pub fn build_search_text(title: &str, excerpt: Option<&str>, url: &str) -> String {
        format!("{} {} {}", title, excerpt.unwrap_or(""), url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tagging {
    pub tag_id: Uuid,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

impl Tag {
    /// Lowercase + trim, the tag normalization rule used throughout ingest.
    pub fn normalize_name(raw: &str) -> String {
        raw.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArchiveCount {
    pub day: chrono::NaiveDate,
    pub bookmark_count: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub query: String,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickMetric {
    pub entry_id: Uuid,
    pub clicked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApiKey {
    pub id: Uuid,
    pub key_hash: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    New,
    Hot,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::New
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_created_at_old_post_keeps_posted_at() {
        let posted = Utc::now() - chrono::Duration::hours(48);
        let now = Utc::now();
        assert_eq!(Entry::derive_created_at(posted, now), posted);
    }

    #[test]
    fn derive_created_at_new_post_uses_now() {
        let posted = Utc::now() - chrono::Duration::hours(1);
        let now = Utc::now();
        assert_eq!(Entry::derive_created_at(posted, now), now);
    }

    #[test]
    fn tag_name_normalized() {
        assert_eq!(Tag::normalize_name("  Rust Lang  "), "rust lang");
    }
}
