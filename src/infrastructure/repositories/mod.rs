//! Repository implementations using SeaORM

pub mod sea_orm_repository;

pub use sea_orm_repository::SeaOrmRepository;
