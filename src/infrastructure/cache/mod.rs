//! Cache implementations
//!
//! `KvCache` speaks the entity contract; the byte-level backends behind it
//! implement [`KeyValueStore`].

pub mod kv_cache;
pub mod memory;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

pub use self::kv_cache::KvCache;
pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

/// Byte-level key-value backend
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Upsert. `ttl` of `None` means no expiry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
    -> Result<(), DomainError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError>;

    /// Number of keys that existed and were removed
    async fn delete(&self, keys: &[String]) -> Result<u64, DomainError>;

    /// Drop every key in the active namespace
    async fn flush(&self) -> Result<(), DomainError>;

    async fn ping(&self) -> Result<String, DomainError>;
}
