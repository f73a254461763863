//! Redis key-value façade (C3) and payload codec (C4).

pub mod client;
pub mod codec;

pub use client::{KVCache, RedisConfig};
