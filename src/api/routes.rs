//! Route table, mounted under the configurable `api_base_path`.

use std::sync::Arc;

use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::middleware::{cors_layer, request_id_middleware};
use super::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let base_path = state.config.api_base_path.clone();

    let api = Router::new()
        .route("/entries/new", get(handlers::list_new_entries))
        .route("/entries/hot", get(handlers::list_hot_entries))
        .route("/tags", get(handlers::list_tags))
        .route("/tags/trending", get(handlers::trending_tags))
        .route("/tags/clicked", get(handlers::clicked_tags))
        .route("/tags/:tag/entries", get(handlers::list_tag_entries))
        .route("/search", get(handlers::search))
        .route("/archive", get(handlers::archive))
        .route("/rankings/yearly", get(handlers::rankings_yearly))
        .route("/rankings/monthly", get(handlers::rankings_monthly))
        .route("/rankings/weekly", get(handlers::rankings_weekly))
        .route("/metrics/clicks", post(handlers::record_click))
        .route("/favicons", get(handlers::favicon))
        .route("/api-keys", post(handlers::create_api_key))
        .with_state(state.clone());

    Router::new()
        .nest(&base_path, api)
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
