//! Domain layer - Storage-neutral abstractions
//!
//! Entity contract, factory, operation context, error taxonomy and the
//! repository/cache traits. Concrete stores live in the infrastructure layer.

pub mod cache;
pub mod codec;
pub mod context;
pub mod entity;
pub mod errors;
pub mod factory;
pub mod repositories;

pub use cache::BaseCache;
pub use context::{CancelHandle, OpContext};
pub use entity::{Base, BaseDomain, DomainName, Status, expect_delta};
pub use errors::{DomainError, ErrorKind};
pub use factory::{DomainFactory, EntityCreator};
pub use repositories::{BaseRepository, SearchRepository};
