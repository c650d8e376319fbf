//! Redis-backed key-value store
//!
//! The logical database selected by the connection URL is the namespace that
//! `flush` clears.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use super::KeyValueStore;
use crate::domain::DomainError;

/// Cloning shares the managed connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to `url` (`redis://host:port/db`).
    pub async fn connect(url: &str) -> Result<Self, DomainError> {
        let client = redis::Client::open(url)
            .map_err(|e| DomainError::Configuration(format!("invalid cache url: {}", e)))?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis cache");
        Ok(Self { conn })
    }
}

/// `PX` argument for `ttl`. PX rejects 0, so partial milliseconds round up.
fn px_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_micros().div_ceil(1000))
        .unwrap_or(u64::MAX)
        .max(1)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(px_millis(ttl));
        }
        cmd.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let mut conn = self.conn.clone();
        let value = redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<Vec<u8>>>(&mut conn)
            .await?;
        Ok(value)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, DomainError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let removed = redis::cmd("DEL")
            .arg(keys)
            .query_async::<_, u64>(&mut conn)
            .await?;
        Ok(removed)
    }

    async fn flush(&self) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        redis::cmd("FLUSHDB")
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<String, DomainError> {
        let mut conn = self.conn.clone();
        let reply = redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;
        Ok(reply)
    }
}
