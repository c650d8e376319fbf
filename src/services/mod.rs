//! Services Layer
//!
//! Facades that callers use instead of talking to a store directly.

pub mod base_service;

pub use base_service::BaseService;
