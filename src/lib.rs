//! # hateblog
//!
//! A read-optimized HTTP serving system for a curated bookmark corpus
//! (Hatena-Bookmark-style entries). Crawlers pull new items from RSS feeds,
//! enrich them with keyphrase tags, and refresh bookmark counts; a public
//! HTTP API serves filtered lists (new/hot by day, tag, archive, search,
//! yearly/monthly/weekly rankings) plus a favicon proxy.
//!
//! ## Architecture
//!
//! - `models`: entry/tag/archive data types
//! - `time`: IANA-timezone-aware date/period math
//! - `config`: environment-driven configuration
//! - `error`: the per-layer error taxonomy and its HTTP mapping
//! - `db`: the relational store façade, connection pool, migrations
//! - `kv`: the Redis key-value façade
//! - `cache`: the typed cache layer (keys, TTLs, codec)
//! - `services`: cache-aware use-case services
//! - `jobguard`: Postgres advisory locking for background jobs
//! - `apikey`: API key issuance and authentication
//! - `api`: the HTTP surface (routes, handlers, middleware)
//! - `ingest`: the RSS ingest pipeline
//! - `update`: the bookmark-count update pipeline

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod models;
pub mod time;
pub mod config;
pub mod error;
pub mod db;
pub mod kv;
pub mod cache;
pub mod services;
pub mod jobguard;
pub mod apikey;
pub mod api;
pub mod ingest;
pub mod update;

/// Re-export version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
