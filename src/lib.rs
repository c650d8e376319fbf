pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::{
    Base, BaseCache, BaseDomain, BaseRepository, CancelHandle, DomainError, DomainFactory,
    DomainName, EntityCreator, ErrorKind, OpContext, SearchRepository, Status,
};
pub use infrastructure::{config, db, telemetry};
