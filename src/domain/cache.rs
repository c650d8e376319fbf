//! Cache trait definition
//!
//! Keys are external ids. Implementations live in the infrastructure layer.

use std::time::Duration;

use async_trait::async_trait;

use super::{Base, DomainError, OpContext};

#[async_trait]
pub trait BaseCache: Send + Sync {
    /// Upsert without expiry
    async fn put(&self, ctx: &OpContext, entity: &dyn Base) -> Result<(), DomainError>;

    /// Upsert; the key is absent once `ttl` has elapsed.
    async fn put_with_ttl(
        &self,
        ctx: &OpContext,
        entity: &dyn Base,
        ttl: Duration,
    ) -> Result<(), DomainError>;

    async fn get(&self, ctx: &OpContext, external_id: &str) -> Result<Box<dyn Base>, DomainError>;

    /// All-or-nothing: the first miss or backend error fails the whole call.
    async fn multi_get(
        &self,
        ctx: &OpContext,
        external_ids: &[String],
    ) -> Result<Vec<Box<dyn Base>>, DomainError>;

    /// Removing an absent key is not an error.
    async fn delete(&self, ctx: &OpContext, external_id: &str) -> Result<(), DomainError>;

    async fn multi_delete(&self, ctx: &OpContext, external_ids: &[String])
    -> Result<(), DomainError>;

    /// Flush every key in the active namespace.
    async fn delete_all(&self, ctx: &OpContext) -> Result<(), DomainError>;

    /// Liveness probe against the backend
    async fn health(&self, ctx: &OpContext) -> Result<(), DomainError>;
}
