//! In-process key-value store
//!
//! Expiry is checked against `tokio::time::Instant`, so a paused test clock
//! drives TTLs. Expired entries are dropped on the read that finds them, and
//! a write sweeps the whole map at most once per [`SWEEP_INTERVAL`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::KeyValueStore;
use crate::domain::DomainError;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// Cloning shares the underlying map.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Entry>>,
    last_sweep: Arc<Mutex<Instant>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            last_sweep: Arc::new(Mutex::new(Instant::now())),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry if the last sweep is older than
    /// [`SWEEP_INTERVAL`]. A concurrent writer already sweeping wins.
    fn sweep_expired(&self, now: Instant) {
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if now.duration_since(*last) < SWEEP_INTERVAL {
            return;
        }
        *last = now;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let swept = before.saturating_sub(self.entries.len());
        if swept > 0 {
            tracing::debug!("Swept {} expired cache entries", swept);
        }
    }

    /// Entries held in the map, expired ones not yet swept included
    pub fn stored_len(&self) -> usize {
        self.entries.len()
    }

    /// Live entries only
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        let now = Instant::now();
        self.sweep_expired(now);
        let expires_at = ttl.map(|ttl| now + ttl);
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        // The read guard is released here; removing under it would deadlock.
        if expired {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(None)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, DomainError> {
        let now = Instant::now();
        let removed = keys
            .iter()
            .filter_map(|key| self.entries.remove(key.as_str()))
            .filter(|(_, entry)| entry.is_live(now))
            .count();
        Ok(removed as u64)
    }

    async fn flush(&self) -> Result<(), DomainError> {
        self.entries.clear();
        Ok(())
    }

    async fn ping(&self) -> Result<String, DomainError> {
        Ok("PONG".to_string())
    }
}
