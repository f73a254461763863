//! Relational-store façade (C2) and connection/migration plumbing.

pub mod entry_store;
pub mod migrations;
pub mod pool;

pub use entry_store::{EntryStore, ListQuery};
pub use pool::{ConnectionPool, DatabaseConfig};
