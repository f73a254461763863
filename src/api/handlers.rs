//! Request handlers. Each parses/validates its own query params,
//! delegates to the matching [`crate::services`] engine, and wraps cacheable
//! reads with [`cached_json`].

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::responses::*;
use super::AppState;
use crate::error::ServiceError;

const ARCHIVE_MIN_USERS_MESSAGE: &str = "min_users must be one of the configured archive whitelist values";
const TRENDING_HOURS: [i64; 4] = [6, 12, 24, 48];
const CLICKED_DAYS: [i64; 3] = [1, 7, 30];

pub async fn list_new_entries(State(state): State<Arc<AppState>>, Query(q): Query<EntriesQuery>) -> Result<Response, ServiceError> {
    let (result, status) = state
        .entry_svc
        .list_new_entries(&q.date, q.min_users.unwrap_or(0), q.limit.unwrap_or(0), q.offset.unwrap_or(0))
        .await?;
    Ok(cached_json(result, status))
}

pub async fn list_hot_entries(State(state): State<Arc<AppState>>, Query(q): Query<EntriesQuery>) -> Result<Response, ServiceError> {
    let (result, status) = state
        .entry_svc
        .list_hot_entries(&q.date, q.min_users.unwrap_or(0), q.limit.unwrap_or(0), q.offset.unwrap_or(0))
        .await?;
    Ok(cached_json(result, status))
}

pub async fn list_tags(State(state): State<Arc<AppState>>, Query(q): Query<TagsListQuery>) -> Result<Response, ServiceError> {
    let (result, status) = state.tag_svc.list(q.limit.unwrap_or(0), q.offset.unwrap_or(0)).await?;
    Ok(cached_json(result, status))
}

pub async fn list_tag_entries(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
    Query(q): Query<TagEntriesQuery>,
) -> Result<Response, ServiceError> {
    let sort = q.sort.unwrap_or_default();
    state.tag_svc.get_by_name(&tag).await?;

    let (result, status) = state
        .entry_svc
        .list_tag_entries(&tag, sort, q.min_users.unwrap_or(0), q.limit.unwrap_or(0), q.offset.unwrap_or(0))
        .await?;
    Ok(cached_json(result, status))
}

pub async fn trending_tags(State(state): State<Arc<AppState>>, Query(q): Query<TrendingQuery>) -> Result<Response, ServiceError> {
    let hours = q.hours.unwrap_or(24);
    if !TRENDING_HOURS.contains(&hours) {
        return Err(ServiceError::InvalidArgument(format!(
            "hours must be one of {TRENDING_HOURS:?}"
        )));
    }
    let tags = state.tag_svc.trending(hours).await?;
    Ok(Json(tags).into_response())
}

pub async fn clicked_tags(State(state): State<Arc<AppState>>, Query(q): Query<ClickedQuery>) -> Result<Response, ServiceError> {
    let days = q.days.unwrap_or(7);
    if !CLICKED_DAYS.contains(&days) {
        return Err(ServiceError::InvalidArgument(format!("days must be one of {CLICKED_DAYS:?}")));
    }
    let tags = state.tag_svc.clicked(days).await?;
    Ok(Json(tags).into_response())
}

pub async fn search(State(state): State<Arc<AppState>>, Query(q): Query<SearchQuery>) -> Result<Response, ServiceError> {
    let (result, status) = state
        .search_svc
        .search(&q.q, q.limit, q.offset, q.min_users, q.sort)
        .await?;
    Ok(cached_json(result, status))
}

pub async fn archive(State(state): State<Arc<AppState>>, Query(q): Query<ArchiveQuery>) -> Result<Response, ServiceError> {
    if !state.config.archive_min_users_whitelist.contains(&q.min_users) {
        return Err(ServiceError::InvalidArgument(ARCHIVE_MIN_USERS_MESSAGE.to_string()));
    }
    let (result, status) = state.archive_svc.list(q.min_users).await?;
    Ok(cached_json(result, status))
}

pub async fn rankings_yearly(State(state): State<Arc<AppState>>, Query(q): Query<YearlyRankingQuery>) -> Result<Response, ServiceError> {
    let (result, status) = state
        .ranking_svc
        .yearly(
            q.year,
            q.common.min_users.unwrap_or(0),
            q.common.limit.unwrap_or(crate::cache::ttl::RANKING_MAX_YEARLY),
            q.common.offset.unwrap_or(0),
        )
        .await?;
    Ok(cached_json(result, status))
}

pub async fn rankings_monthly(State(state): State<Arc<AppState>>, Query(q): Query<MonthlyRankingQuery>) -> Result<Response, ServiceError> {
    let (result, status) = state
        .ranking_svc
        .monthly(
            q.year,
            q.month,
            q.common.min_users.unwrap_or(0),
            q.common.limit.unwrap_or(crate::cache::ttl::RANKING_MAX_MONTHLY),
            q.common.offset.unwrap_or(0),
        )
        .await?;
    Ok(cached_json(result, status))
}

pub async fn rankings_weekly(State(state): State<Arc<AppState>>, Query(q): Query<WeeklyRankingQuery>) -> Result<Response, ServiceError> {
    let (result, status) = state
        .ranking_svc
        .weekly(
            q.year,
            q.week,
            q.common.min_users.unwrap_or(0),
            q.common.limit.unwrap_or(crate::cache::ttl::RANKING_MAX_WEEKLY),
            q.common.offset.unwrap_or(0),
        )
        .await?;
    Ok(cached_json(result, status))
}

pub async fn record_click(State(state): State<Arc<AppState>>, Json(body): Json<ClickRequest>) -> Result<Response, ServiceError> {
    state.metrics_svc.record_click(body.entry_id).await?;
    Ok((axum::http::StatusCode::NO_CONTENT, ()).into_response())
}

pub async fn favicon(State(state): State<Arc<AppState>>, Query(q): Query<FaviconQuery>) -> Result<Response, ServiceError> {
    let (payload, status) = state.favicon_svc.get(&q.domain).await?;
    let content_type = payload.content_type.clone();
    let mut response = (axum::http::StatusCode::OK, payload.bytes).into_response();
    response
        .headers_mut()
        .insert(axum::http::header::CONTENT_TYPE, content_type.parse().unwrap_or_else(|_| "image/png".parse().unwrap()));
    response
        .headers_mut()
        .insert(CACHE_HEADER, status.header_value().parse().expect("static header value"));
    Ok(response)
}

pub async fn create_api_key(State(state): State<Arc<AppState>>, Json(body): Json<ApiKeyRequest>) -> Result<Response, ServiceError> {
    let issued = state
        .apikey_svc
        .issue(body.name, body.description, body.expires_at)
        .await?;
    Ok(Json(ApiKeyResponse {
        id: issued.id,
        key: issued.plaintext,
    })
    .into_response())
}

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let db = state.db_pool.health_check().await.is_healthy;
    let cache = state.kv.ping().await;
    HealthResponse {
        status: if db && cache { "healthy" } else { "unhealthy" },
        database: db,
        cache,
    }
    .into_response()
}
