//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::Value;

use super::{Base, DomainError, OpContext};

/// Generic persistence for one domain.
///
/// Every entity returned is built through the factory entry for the
/// repository's domain, so callers get the concrete type back behind
/// `Box<dyn Base>`.
#[async_trait]
pub trait BaseRepository: Send + Sync {
    /// Find an entity by surrogate id
    async fn get_by_id(&self, ctx: &OpContext, id: u64) -> Result<Box<dyn Base>, DomainError>;

    /// Find an entity by external id
    async fn get_by_external_id(
        &self,
        ctx: &OpContext,
        external_id: &str,
    ) -> Result<Box<dyn Base>, DomainError>;

    /// Entities for every id found. Missing ids are omitted, order is not
    /// guaranteed.
    async fn multi_get_by_external_id(
        &self,
        ctx: &OpContext,
        external_ids: &[String],
    ) -> Result<Vec<Box<dyn Base>>, DomainError>;

    /// Persist a new entity and return it with its surrogate id populated
    async fn create(
        &self,
        ctx: &OpContext,
        entity: Box<dyn Base>,
    ) -> Result<Box<dyn Base>, DomainError>;

    /// Read the current row, merge `delta` into it and write it back.
    ///
    /// Not isolated: concurrent updates of the same id race and the last
    /// write wins. The write never touches a soft-deleted row, so an update
    /// racing a soft delete fails with `NotFound` instead of restoring it.
    async fn update(
        &self,
        ctx: &OpContext,
        external_id: &str,
        delta: &dyn Base,
    ) -> Result<Box<dyn Base>, DomainError>;

    /// Mark an entity deleted. Soft-deleted entities disappear from reads.
    async fn soft_delete(&self, ctx: &OpContext, external_id: &str) -> Result<(), DomainError>;

    /// Domain-specific search. Concrete repositories override this.
    async fn search(
        &self,
        _ctx: &OpContext,
        _params: &HashMap<String, String>,
    ) -> Result<Vec<Box<dyn Base>>, DomainError> {
        Err(DomainError::NotImplemented("search"))
    }
}

/// Column-level search on top of [`BaseRepository`].
#[async_trait]
pub trait SearchRepository: BaseRepository {
    /// Entities whose `column` equals `value`
    async fn exact_search(
        &self,
        ctx: &OpContext,
        column: &str,
        value: Value,
    ) -> Result<Vec<Box<dyn Base>>, DomainError>;

    /// Entities whose `column` lies in `[start, end]`
    async fn range_search(
        &self,
        ctx: &OpContext,
        column: &str,
        start: Value,
        end: Value,
    ) -> Result<Vec<Box<dyn Base>>, DomainError>;

    async fn text_search(
        &self,
        _ctx: &OpContext,
        _text: &str,
    ) -> Result<Vec<Box<dyn Base>>, DomainError> {
        Err(DomainError::NotImplemented("text_search"))
    }

    /// Index definitions backing `text_search`
    async fn index_mappings(&self, _ctx: &OpContext) -> Result<serde_json::Value, DomainError> {
        Err(DomainError::NotImplemented("index_mappings"))
    }
}
