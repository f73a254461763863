//! Relational-store façade. Issues the parameterized reads
//! and upserts the rest of the system needs; nothing else about the store's
//! schema leaks past this module.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{ArchiveCount, Entry, SortOrder, Tagging};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub tags: Vec<String>,
    pub keyword: Option<String>,
    pub min_bookmark_count: i64,
    pub posted_at_from: Option<DateTime<Utc>>,
    pub posted_at_to: Option<DateTime<Utc>>,
    pub offset: i64,
    pub limit: i64,
    pub sort: SortOrder,
    pub max_limit_override: Option<i64>,
}

impl ListQuery {
    /// Applies defaulting, clamping, and canonicalizing rules so that
    /// equivalent requests produce identical cache keys.
    pub fn normalize(mut self) -> Self {
        if self.limit <= 0 {
            self.limit = DEFAULT_LIMIT;
        }
        let cap = self.max_limit_override.unwrap_or(MAX_LIMIT);
        if self.limit > cap {
            self.limit = cap;
        }
        if self.offset < 0 {
            self.offset = 0;
        }
        if self.min_bookmark_count < 0 {
            self.min_bookmark_count = 0;
        }
        self.keyword = self.keyword.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        self.tags = {
            let mut tags: Vec<String> = self
                .tags
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
            tags.sort();
            tags.dedup();
            tags
        };
        self
    }
}

#[derive(Clone)]
pub struct EntryStore {
    pool: PgPool,
}

impl EntryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn append_filters<'a>(builder: &mut QueryBuilder<'a, sqlx::Postgres>, q: &'a ListQuery) {
        builder.push(" WHERE e.bookmark_count >= ").push_bind(q.min_bookmark_count);

        if let Some(from) = q.posted_at_from {
            builder.push(" AND e.posted_at >= ").push_bind(from);
        }
        if let Some(to) = q.posted_at_to {
            builder.push(" AND e.posted_at < ").push_bind(to);
        }
        if let Some(keyword) = &q.keyword {
            builder
                .push(" AND e.search_text ILIKE ")
                .push_bind(format!("%{keyword}%"));
        }
        if !q.tags.is_empty() {
            builder.push(" AND EXISTS (SELECT 1 FROM entry_tags et JOIN tags t ON t.id = et.tag_id WHERE et.entry_id = e.id AND t.name = ANY(");
            builder.push_bind(&q.tags);
            builder.push("))");
        }
    }

    pub async fn list(&self, q: &ListQuery) -> Result<Vec<Entry>, DbError> {
        let mut builder = QueryBuilder::new(
            "SELECT e.id, e.url, e.title, e.excerpt, e.subject, e.bookmark_count, e.posted_at, e.created_at, e.updated_at, e.search_text FROM entries e",
        );
        Self::append_filters(&mut builder, q);

        match q.sort {
            SortOrder::New => builder.push(" ORDER BY e.created_at DESC"),
            SortOrder::Hot => builder.push(" ORDER BY e.bookmark_count DESC, e.created_at DESC"),
        };

        builder.push(" LIMIT ").push_bind(q.limit);
        builder.push(" OFFSET ").push_bind(q.offset);

        let entries: Vec<Entry> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(entries)
    }

    pub async fn count(&self, q: &ListQuery) -> Result<i64, DbError> {
        let mut builder = QueryBuilder::new("SELECT count(*) FROM entries e");
        Self::append_filters(&mut builder, q);
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Entry>, DbError> {
        let entry = sqlx::query_as::<_, Entry>(
            "SELECT id, url, title, excerpt, subject, bookmark_count, posted_at, created_at, updated_at, search_text FROM entries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    pub async fn tags_for(&self, entry_id: Uuid) -> Result<Vec<Tagging>, DbError> {
        let tags = sqlx::query_as::<_, Tagging>(
            "SELECT t.id AS tag_id, t.name, et.score FROM entry_tags et JOIN tags t ON t.id = et.tag_id WHERE et.entry_id = $1",
        )
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    /// Upsert by URL (the natural key). Returns `(id, inserted)`.
    pub async fn upsert_by_url(&self, entry: &Entry) -> Result<(Uuid, bool), DbError> {
        let row: (Uuid, bool) = sqlx::query_as(
            r#"
            INSERT INTO entries (id, url, title, excerpt, subject, bookmark_count, posted_at, created_at, updated_at, search_text)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (url) DO UPDATE SET
                title = EXCLUDED.title,
                excerpt = EXCLUDED.excerpt,
                subject = EXCLUDED.subject,
                bookmark_count = EXCLUDED.bookmark_count,
                updated_at = EXCLUDED.updated_at,
                search_text = EXCLUDED.search_text
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(entry.id)
        .bind(&entry.url)
        .bind(&entry.title)
        .bind(&entry.excerpt)
        .bind(&entry.subject)
        .bind(entry.bookmark_count)
        .bind(entry.posted_at)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .bind(&entry.search_text)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_archive_counts(&self, min_bookmarks: i64) -> Result<Vec<ArchiveCount>, DbError> {
        let rows = sqlx::query_as::<_, ArchiveCount>(
            "SELECT day, bookmark_count, count FROM archive_counts WHERE bookmark_count >= $1 ORDER BY day ASC",
        )
        .bind(min_bookmarks)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Transactional delete-then-reaggregate for a single day. Idempotent.
    pub async fn refresh_archive_counts_for_day(&self, day: NaiveDate) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM archive_counts WHERE day = $1")
            .bind(day)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO archive_counts (day, bookmark_count, count)
            SELECT $1, bookmark_count, count(*)
            FROM entries
            WHERE posted_at::date = $1
            GROUP BY bookmark_count
            "#,
        )
        .bind(day)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Transactional truncate + full re-aggregate across every day on record.
    pub async fn rebuild_archive_counts(&self) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("TRUNCATE archive_counts").execute(&mut *tx).await?;

        sqlx::query(
            r#"
            INSERT INTO archive_counts (day, bookmark_count, count)
            SELECT posted_at::date, bookmark_count, count(*)
            FROM entries
            GROUP BY posted_at::date, bookmark_count
            "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// URLs ordered by staleness, restricted to a tier predicate.
    pub async fn urls_for_update(&self, tier_sql: &str, limit: i64) -> Result<Vec<(Uuid, String)>, DbError> {
        let sql = format!(
            "SELECT id, url FROM entries WHERE {tier_sql} ORDER BY updated_at ASC LIMIT $1"
        );
        let rows: Vec<(Uuid, String)> = sqlx::query_as(&sql).bind(limit).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn update_bookmark_count(&self, id: Uuid, count: Option<i64>, now: DateTime<Utc>) -> Result<u64, DbError> {
        let result = match count {
            Some(c) => {
                sqlx::query("UPDATE entries SET bookmark_count = $1, updated_at = $2 WHERE id = $3")
                    .bind(c)
                    .bind(now)
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("UPDATE entries SET updated_at = $1 WHERE id = $2")
                    .bind(now)
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }

    pub async fn find_by_url(&self, url: &str) -> Result<Option<Entry>, DbError> {
        let entry = sqlx::query_as::<_, Entry>(
            "SELECT id, url, title, excerpt, subject, bookmark_count, posted_at, created_at, updated_at, search_text FROM entries WHERE url = $1",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    /// Merge the losing scheme's row into the surviving one: keep `keep_id`'s
    /// row, apply `merged_count`, drop `loser_id`.
    pub async fn merge_scheme_entries(&self, keep_id: Uuid, loser_id: Uuid, merged_count: i64, now: DateTime<Utc>) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE entries SET bookmark_count = $1, updated_at = $2 WHERE id = $3")
            .bind(merged_count)
            .bind(now)
            .bind(keep_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(loser_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Entries with no row in `entry_tags` yet — candidates for keyphrase
    /// tagging.
    pub async fn list_untagged(&self, limit: i64) -> Result<Vec<Entry>, DbError> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT e.id, e.url, e.title, e.excerpt, e.subject, e.bookmark_count, e.posted_at, e.created_at, e.updated_at, e.search_text
            FROM entries e
            WHERE NOT EXISTS (SELECT 1 FROM entry_tags et WHERE et.entry_id = e.id)
            ORDER BY e.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_defaults_and_clamps_limit() {
        let q = ListQuery {
            limit: 0,
            ..Default::default()
        }
        .normalize();
        assert_eq!(q.limit, DEFAULT_LIMIT);

        let q = ListQuery {
            limit: 500,
            ..Default::default()
        }
        .normalize();
        assert_eq!(q.limit, MAX_LIMIT);

        let q = ListQuery {
            limit: 500,
            max_limit_override: Some(1000),
            ..Default::default()
        }
        .normalize();
        assert_eq!(q.limit, 500);
    }

    #[test]
    fn normalize_sorts_and_dedups_tags() {
        let q = ListQuery {
            tags: vec!["Rust".to_string(), " go ".to_string(), "rust".to_string()],
            ..Default::default()
        }
        .normalize();
        assert_eq!(q.tags, vec!["go".to_string(), "rust".to_string()]);
    }

    #[test]
    fn normalize_clamps_offset_and_min_bookmark_count() {
        let q = ListQuery {
            offset: -5,
            min_bookmark_count: -1,
            ..Default::default()
        }
        .normalize();
        assert_eq!(q.offset, 0);
        assert_eq!(q.min_bookmark_count, 0);
    }
}
