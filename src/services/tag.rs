//! TagSvc: tag listing, lookup-by-name, and fire-and-forget view
//! recording for the `tags/trending` and `tags/clicked` feeds.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::{keys, ttl, CacheStatus, TypedCache};
use crate::error::{DbError, ServiceError};
use crate::models::Tag;

use super::{ListResult, Served};

#[derive(Clone)]
pub struct TagSvc {
    pool: PgPool,
    list_cache: TypedCache<ListResult<Tag>>,
}

impl TagSvc {
    pub fn new(pool: PgPool, list_cache: TypedCache<ListResult<Tag>>) -> Self {
        Self { pool, list_cache }
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Served<ListResult<Tag>>, ServiceError> {
        let limit = if limit <= 0 { 20 } else { limit.min(100) };
        let offset = offset.max(0);
        let key = keys::tags_list(limit, offset);

        if let Some(cached) = self.list_cache.get(&key).await? {
            return Ok((cached, CacheStatus::Hit));
        }

        let items: Vec<Tag> = sqlx::query_as("SELECT id, name FROM tags ORDER BY name ASC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        let (total,): (i64,) = sqlx::query_as("SELECT count(*) FROM tags")
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        let result = ListResult { items, total };
        self.list_cache.set(&key, &result, ttl::TAGS_LIST).await;
        Ok((result, CacheStatus::Miss))
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Tag, ServiceError> {
        let normalized = Tag::normalize_name(name);
        let tag: Option<Tag> = sqlx::query_as("SELECT id, name FROM tags WHERE name = $1")
            .bind(&normalized)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        tag.ok_or_else(|| ServiceError::NotFound(format!("tag not found: {normalized}")))
    }

    /// Trending/clicked tag feeds read the view history within a window;
    /// the write side is fire-and-forget and never fails the caller.
    pub async fn record_view(&self, tag_id: Uuid, at: DateTime<Utc>) {
        let result = sqlx::query("INSERT INTO tag_view_history (tag_id, viewed_at) VALUES ($1, $2)")
            .bind(tag_id)
            .bind(at)
            .execute(&self.pool)
            .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, "tag view recording failed");
        }
    }

    pub async fn trending(&self, hours: i64) -> Result<Vec<Tag>, ServiceError> {
        let since = Utc::now() - chrono::Duration::hours(hours);
        let tags: Vec<Tag> = sqlx::query_as(
            r#"
            SELECT t.id, t.name FROM tags t
            JOIN tag_view_history v ON v.tag_id = t.id
            WHERE v.viewed_at >= $1
            GROUP BY t.id, t.name
            ORDER BY count(*) DESC
            LIMIT 20
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(tags)
    }

    pub async fn clicked(&self, days: i64) -> Result<Vec<Tag>, ServiceError> {
        let since = Utc::now() - chrono::Duration::days(days);
        let tags: Vec<Tag> = sqlx::query_as(
            r#"
            SELECT t.id, t.name FROM tags t
            JOIN entry_tags et ON et.tag_id = t.id
            JOIN click_metrics c ON c.entry_id = et.entry_id
            WHERE c.clicked_at >= $1
            GROUP BY t.id, t.name
            ORDER BY count(*) DESC
            LIMIT 20
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        Ok(tags)
    }
}
