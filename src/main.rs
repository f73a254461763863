//! hateblog entry point: `serve` runs the HTTP API; `ingest`, `update`,
//! `rebuild-archive`, and `purge-cache` are one-shot background jobs meant
//! to be invoked from a scheduler (cron, systemd timer).

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hateblog::api::{self, AppState};
use hateblog::apikey::ApiKeyService;
use hateblog::cache::{NegativeCache, RateLimitGate, TypedCache};
use hateblog::config::{Config, LogFormat};
use hateblog::db::{self, ConnectionPool, EntryStore};
use hateblog::ingest::keyphrase::KeyphraseClient;
use hateblog::ingest::{IngestConfig, IngestPipeline};
use hateblog::kv::KVCache;
use hateblog::services::archive::ArchiveSvc;
use hateblog::services::entry::EntrySvc;
use hateblog::services::favicon::{FaviconSvc, ReqwestFaviconFetcher};
use hateblog::services::metrics::MetricsSvc;
use hateblog::services::ranking::RankingSvc;
use hateblog::services::search::{PgSearchHistoryRecorder, SearchSvc};
use hateblog::services::tag::TagSvc;
use hateblog::time::TimeProvider;
use hateblog::update::bookmark_api::BookmarkCountClient;
use hateblog::update::{Tier, UpdatePipeline};

#[derive(Parser)]
#[command(name = "hateblog", version = hateblog::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server.
    Serve,
    /// Run one RSS ingest tick.
    Ingest,
    /// Run one bookmark-count update tick.
    Update {
        #[arg(long, value_enum, default_value = "high")]
        tier: TierArg,
    },
    /// Recompute the archive day-count table from scratch.
    RebuildArchive,
    /// Purge cache keys matching a `hateblog:`-prefixed pattern.
    PurgeCache {
        #[arg(long)]
        pattern: String,
        /// Required confirmation; refuses to run without it.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum TierArg {
    High,
    Low,
}

impl From<TierArg> for Tier {
    fn from(t: TierArg) -> Self {
        match t {
            TierArg::High => Tier::High,
            TierArg::Low => Tier::Low,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config);

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Ingest => run_ingest(config).await,
        Command::Update { tier } => run_update(config, tier.into()).await,
        Command::RebuildArchive => rebuild_archive(config).await,
        Command::PurgeCache { pattern, yes } => purge_cache(config, &pattern, yes).await,
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}

async fn connect_pool(config: &Config) -> anyhow::Result<ConnectionPool> {
    let pool = ConnectionPool::connect(&config.database).await?;
    db::migrations::run(pool.inner()).await?;
    Ok(pool)
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let pool = connect_pool(&config).await?;
    let kv = KVCache::connect(&config.redis).await?;
    let time = TimeProvider::new(&config.timezone);

    let store = EntryStore::new(pool.inner().clone());

    let entry_svc = EntrySvc::new(
        store.clone(),
        time.clone(),
        TypedCache::new(kv.clone(), config.cache_enabled),
        TypedCache::new(kv.clone(), config.cache_enabled),
    );

    let search_svc = SearchSvc::new(
        store.clone(),
        TypedCache::new(kv.clone(), config.cache_enabled),
        Arc::new(PgSearchHistoryRecorder::new(pool.inner().clone())),
    );

    let ranking_svc = RankingSvc::new(store.clone(), time.clone(), TypedCache::new(kv.clone(), config.cache_enabled));

    let archive_svc = ArchiveSvc::new(
        store.clone(),
        time.clone(),
        TypedCache::new(kv.clone(), config.cache_enabled),
        TypedCache::new(kv.clone(), config.cache_enabled),
        config.archive_ttl_today,
        config.archive_ttl_past,
        config.archive_ttl_default,
    );

    let tag_svc = TagSvc::new(pool.inner().clone(), TypedCache::new(kv.clone(), config.cache_enabled));

    let favicon_svc = FaviconSvc::new(
        Arc::new(ReqwestFaviconFetcher::new(config.external.favicon_api_timeout)),
        TypedCache::new(kv.clone(), config.cache_enabled),
        NegativeCache::new(kv.clone()),
        RateLimitGate::new(kv.clone()),
        config.external.favicon_cache_ttl,
        config.external.favicon_negative_ttl,
        config.external.favicon_rate_limit_window,
    );

    let metrics_svc = MetricsSvc::new(store.clone(), pool.inner().clone());
    let apikey_svc = ApiKeyService::new(pool.inner().clone());

    let state = Arc::new(AppState {
        config: config.clone(),
        db_pool: pool.clone(),
        kv: kv.clone(),
        entry_svc,
        search_svc,
        ranking_svc,
        archive_svc,
        tag_svc,
        favicon_svc,
        metrics_svc,
        apikey_svc,
    });

    let router = api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %addr, "starting hateblog HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

async fn run_ingest(config: Config) -> anyhow::Result<()> {
    let pool = connect_pool(&config).await?;
    let time = TimeProvider::new(&config.timezone);
    let store = EntryStore::new(pool.inner().clone());
    let http = reqwest::Client::new();

    let keyphrase = config
        .external
        .keyphrase_api_key
        .clone()
        .map(|key| KeyphraseClient::new(key, config.external.keyphrase_api_timeout));

    let pipeline = IngestPipeline::new(
        store,
        time,
        http,
        IngestConfig {
            feed_urls: config.external.rss_feed_urls.clone(),
            max_entries: config.ingest_max_entries,
            top_n: config.external.keyphrase_top_n,
            min_interval: config.external.keyphrase_min_interval,
        },
        keyphrase,
    );

    match pipeline.run_once().await? {
        Some(report) => tracing::info!(?report, "ingest tick complete"),
        None => tracing::info!("ingest already running elsewhere, skipping"),
    }

    pool.close().await;
    Ok(())
}

async fn run_update(config: Config, tier: Tier) -> anyhow::Result<()> {
    let pool = connect_pool(&config).await?;
    let time = TimeProvider::new(&config.timezone);
    let store = EntryStore::new(pool.inner().clone());

    let client = BookmarkCountClient::new(
        config.external.yahoo_app_id.clone(),
        config.external.bookmark_api_timeout,
        config.external.bookmark_api_max_urls,
    );

    let pipeline = UpdatePipeline::new(store, time, client, config.updater_batch_size as i64, true);

    match pipeline.run_once(tier).await? {
        Some(report) => tracing::info!(?report, "update tick complete"),
        None => tracing::info!("update already running elsewhere, skipping"),
    }

    pool.close().await;
    Ok(())
}

async fn rebuild_archive(config: Config) -> anyhow::Result<()> {
    let pool = connect_pool(&config).await?;
    let store = EntryStore::new(pool.inner().clone());
    store.rebuild_archive_counts().await?;
    tracing::info!("archive counts rebuilt");
    pool.close().await;
    Ok(())
}

async fn purge_cache(config: Config, pattern: &str, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("refusing to purge cache pattern '{pattern}' without --yes");
    }

    let kv = KVCache::connect(&config.redis).await?;
    let purged = hateblog::cache::purge_pattern(&kv, pattern, 500).await?;
    tracing::info!(purged, pattern, "cache purge complete");
    Ok(())
}
