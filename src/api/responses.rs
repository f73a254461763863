//! Query-parameter shapes and response envelopes for every endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::CacheStatus;
use crate::models::SortOrder;

pub const CACHE_HEADER: &str = "X-Cache";

/// Wraps a JSON body with the `X-Cache` header every cacheable read sets.
pub fn cached_json<T: Serialize>(value: T, status: CacheStatus) -> Response {
    let mut response = (StatusCode::OK, Json(value)).into_response();
    response
        .headers_mut()
        .insert(CACHE_HEADER, status.header_value().parse().expect("static header value"));
    response
}

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub date: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub min_users: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TagEntriesQuery {
    pub sort: Option<SortOrder>,
    pub min_users: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TagsListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub hours: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ClickedQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub min_users: Option<i64>,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveQuery {
    pub min_users: i64,
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub min_users: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct YearlyRankingQuery {
    pub year: i32,
    #[serde(flatten)]
    pub common: RankingQuery,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyRankingQuery {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub common: RankingQuery,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyRankingQuery {
    pub year: i32,
    pub week: u32,
    #[serde(flatten)]
    pub common: RankingQuery,
}

#[derive(Debug, Deserialize)]
pub struct FaviconQuery {
    pub domain: String,
}

#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub entry_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ApiKeyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub id: Uuid,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub cache: bool,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let code = if self.database && self.cache {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (code, Json(self)).into_response()
    }
}
