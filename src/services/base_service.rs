//! Base Service - generic facade over one repository
//!
//! Delegates 1:1 and never translates errors. Services that also own a cache
//! sequence the cache-aside calls themselves.

use std::sync::Arc;

use crate::domain::{Base, BaseRepository, DomainError, OpContext};

#[derive(Clone)]
pub struct BaseService {
    persistence: Arc<dyn BaseRepository>,
}

impl BaseService {
    pub fn new(persistence: Arc<dyn BaseRepository>) -> Self {
        Self { persistence }
    }

    pub fn persistence(&self) -> &Arc<dyn BaseRepository> {
        &self.persistence
    }

    pub async fn find_by_id(&self, ctx: &OpContext, id: u64) -> Result<Box<dyn Base>, DomainError> {
        self.persistence.get_by_id(ctx, id).await
    }

    pub async fn find_by_external_id(
        &self,
        ctx: &OpContext,
        external_id: &str,
    ) -> Result<Box<dyn Base>, DomainError> {
        self.persistence.get_by_external_id(ctx, external_id).await
    }

    pub async fn multi_get_by_external_id(
        &self,
        ctx: &OpContext,
        external_ids: &[String],
    ) -> Result<Vec<Box<dyn Base>>, DomainError> {
        self.persistence
            .multi_get_by_external_id(ctx, external_ids)
            .await
    }

    pub async fn create(
        &self,
        ctx: &OpContext,
        entity: Box<dyn Base>,
    ) -> Result<Box<dyn Base>, DomainError> {
        tracing::debug!("Create {}", entity.table());
        self.persistence.create(ctx, entity).await
    }

    pub async fn update(
        &self,
        ctx: &OpContext,
        external_id: &str,
        delta: &dyn Base,
    ) -> Result<Box<dyn Base>, DomainError> {
        tracing::debug!("Update {} {}", delta.table(), external_id);
        self.persistence.update(ctx, external_id, delta).await
    }
}
