//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Database connection (db)
//! - Configuration loading (config)
//! - Tracing subscriber setup (telemetry)
//! - Repository implementations (repositories)
//! - Cache backends and the entity cache (cache)

pub mod cache;
pub mod config;
pub mod db;
pub mod repositories;
pub mod telemetry;

pub use cache::{KeyValueStore, KvCache, MemoryStore, RedisStore};
pub use repositories::*;
