//! Entity cache over a key-value store
//!
//! Keys are external ids, values are the entity's binary encoding. Values are
//! hydrated through the factory entry for the cache's domain.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::Instrument;

use super::KeyValueStore;
use crate::domain::{Base, BaseCache, DomainError, DomainFactory, DomainName, OpContext};

pub struct KvCache<S> {
    store: S,
    factory: Arc<DomainFactory>,
    domain: DomainName,
}

impl<S: KeyValueStore> KvCache<S> {
    pub fn new(store: S, factory: Arc<DomainFactory>, domain: impl Into<DomainName>) -> Self {
        Self {
            store,
            factory,
            domain: domain.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn domain(&self) -> &DomainName {
        &self.domain
    }

    fn span(&self, ctx: &OpContext, op: &'static str) -> tracing::Span {
        tracing::debug_span!(
            "cache",
            op = op,
            domain = %self.domain,
            request_id = ctx.request_id().unwrap_or_default()
        )
    }

    async fn traced<T, F>(
        &self,
        ctx: &OpContext,
        op: &'static str,
        operation: F,
    ) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>> + Send,
    {
        ctx.run(operation).instrument(self.span(ctx, op)).await
    }

    fn hydrate(&self, bytes: &[u8]) -> Result<Box<dyn Base>, DomainError> {
        let mut entity = self.factory.create(self.domain.as_str())?;
        entity.unmarshal_binary(bytes)?;
        Ok(entity)
    }

    async fn fetch(&self, external_id: &str) -> Result<Box<dyn Base>, DomainError> {
        match self.store.get(external_id).await? {
            Some(bytes) => self.hydrate(&bytes),
            None => Err(DomainError::not_found(self.domain.as_str(), external_id)),
        }
    }

    fn key_of(entity: &dyn Base) -> Result<&str, DomainError> {
        let key = entity.external_id();
        if key.is_empty() {
            return Err(DomainError::ConstraintViolation(format!(
                "cannot cache {} without an external id",
                entity.table()
            )));
        }
        Ok(key)
    }

    async fn write(&self, entity: &dyn Base, ttl: Option<Duration>) -> Result<(), DomainError> {
        let key = Self::key_of(entity)?;
        let bytes = entity.marshal_binary()?;
        self.store.set(key, bytes, ttl).await
    }
}

#[async_trait]
impl<S: KeyValueStore> BaseCache for KvCache<S> {
    async fn put(&self, ctx: &OpContext, entity: &dyn Base) -> Result<(), DomainError> {
        self.traced(ctx, "put", self.write(entity, None)).await
    }

    async fn put_with_ttl(
        &self,
        ctx: &OpContext,
        entity: &dyn Base,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        self.traced(ctx, "put_with_ttl", async {
            if ttl.is_zero() {
                // Already expired
                let key = Self::key_of(entity)?;
                self.store.delete(&[key.to_string()]).await?;
                return Ok(());
            }
            self.write(entity, Some(ttl)).await
        })
        .await
    }

    async fn get(&self, ctx: &OpContext, external_id: &str) -> Result<Box<dyn Base>, DomainError> {
        self.traced(ctx, "get", self.fetch(external_id)).await
    }

    async fn multi_get(
        &self,
        ctx: &OpContext,
        external_ids: &[String],
    ) -> Result<Vec<Box<dyn Base>>, DomainError> {
        self.traced(ctx, "multi_get", async {
            let mut entities = Vec::with_capacity(external_ids.len());
            for external_id in external_ids {
                entities.push(self.fetch(external_id).await?);
            }
            Ok(entities)
        })
        .await
    }

    async fn delete(&self, ctx: &OpContext, external_id: &str) -> Result<(), DomainError> {
        self.traced(ctx, "delete", async {
            self.store.delete(&[external_id.to_string()]).await?;
            Ok(())
        })
        .await
    }

    async fn multi_delete(
        &self,
        ctx: &OpContext,
        external_ids: &[String],
    ) -> Result<(), DomainError> {
        if external_ids.is_empty() {
            return Ok(());
        }
        self.traced(ctx, "multi_delete", async {
            let removed = self.store.delete(external_ids).await?;
            tracing::debug!("Removed {} of {} keys", removed, external_ids.len());
            Ok(())
        })
        .await
    }

    async fn delete_all(&self, ctx: &OpContext) -> Result<(), DomainError> {
        self.traced(ctx, "delete_all", async {
            self.store.flush().await?;
            tracing::warn!("Flushed cache namespace");
            Ok(())
        })
        .await
    }

    async fn health(&self, ctx: &OpContext) -> Result<(), DomainError> {
        self.traced(ctx, "health", async {
            let reply = self
                .store
                .ping()
                .await
                .map_err(|e| DomainError::BackendUnavailable(e.to_string()))?;
            tracing::debug!("Cache ping: {}", reply);
            Ok(())
        })
        .await
    }
}
