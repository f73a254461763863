//! # hateblog HTTP API
//!
//! Stateless request-parameter validation over [`crate::services`]; JSON
//! responses with an `X-Cache: HIT|MISS` header on cacheable reads.
//!
//! ## Endpoints
//!
//! - `GET /entries/new`, `GET /entries/hot`
//! - `GET /tags`, `GET /tags/:tag/entries`, `GET /tags/trending`, `GET /tags/clicked`
//! - `GET /search`
//! - `GET /archive`
//! - `GET /rankings/yearly`, `/monthly`, `/weekly`
//! - `POST /metrics/clicks`
//! - `GET /favicons`
//! - `POST /api-keys`
//! - `GET /health`

pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod routes;

use std::sync::Arc;

use crate::apikey::ApiKeyService;
use crate::config::Config;
use crate::db::ConnectionPool;
use crate::kv::KVCache;
use crate::services::archive::ArchiveSvc;
use crate::services::entry::EntrySvc;
use crate::services::favicon::FaviconSvc;
use crate::services::metrics::MetricsSvc;
use crate::services::ranking::RankingSvc;
use crate::services::search::SearchSvc;
use crate::services::tag::TagSvc;

/// Shared application state, handed to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: ConnectionPool,
    pub kv: KVCache,
    pub entry_svc: EntrySvc,
    pub search_svc: SearchSvc,
    pub ranking_svc: RankingSvc,
    pub archive_svc: ArchiveSvc,
    pub tag_svc: TagSvc,
    pub favicon_svc: FaviconSvc,
    pub metrics_svc: MetricsSvc,
    pub apikey_svc: ApiKeyService,
}

pub use routes::build_router;
