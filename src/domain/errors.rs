//! Domain error types
//!
//! Every failure surfaced by a repository, cache or factory is one of these
//! kinds. Backend errors are classified, never swallowed: the original message
//! travels with the variant.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// No row or key matched
    #[error("{domain} not found: {key}")]
    NotFound { domain: String, key: String },
    /// Uniqueness or foreign-key violation on write
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    /// Contract point that the concrete store does not provide
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    /// Hydrate or encode failure (malformed row, bad payload, type mismatch)
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Connection or health failure
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("operation timed out")]
    Timeout,
    #[error("operation cancelled")]
    Cancelled,
    /// Factory lookup for an unregistered domain
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Store failure that fits no narrower kind
    #[error("backend error: {0}")]
    Backend(String),
}

/// Flat view of the taxonomy, for callers that branch on the kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    ConstraintViolation,
    NotImplemented,
    Serialization,
    BackendUnavailable,
    Timeout,
    Cancelled,
    Configuration,
    Backend,
}

impl DomainError {
    pub fn not_found(domain: impl Into<String>, key: impl Into<String>) -> Self {
        DomainError::NotFound {
            domain: domain.into(),
            key: key.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            DomainError::NotImplemented(_) => ErrorKind::NotImplemented,
            DomainError::Serialization(_) => ErrorKind::Serialization,
            DomainError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            DomainError::Timeout => ErrorKind::Timeout,
            DomainError::Cancelled => ErrorKind::Cancelled,
            DomainError::Configuration(_) => ErrorKind::Configuration,
            DomainError::Backend(_) => ErrorKind::Backend,
        }
    }

    /// True for a plain miss. Cache-aside callers fall back on this and
    /// propagate everything else.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }
}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                return DomainError::ConstraintViolation(msg);
            }
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return DomainError::ConstraintViolation(msg);
            }
            _ => {}
        }

        match e {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
                DomainError::BackendUnavailable(e.to_string())
            }
            DbErr::Type(_) | DbErr::Json(_) | DbErr::TryIntoErr { .. } => {
                DomainError::Serialization(e.to_string())
            }
            DbErr::RecordNotFound(msg) => DomainError::not_found("record", msg),
            other => DomainError::Backend(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for DomainError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_timeout() {
            DomainError::Timeout
        } else if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() {
            DomainError::BackendUnavailable(e.to_string())
        } else if e.kind() == redis::ErrorKind::TypeError {
            DomainError::Serialization(e.to_string())
        } else {
            DomainError::Backend(e.to_string())
        }
    }
}

impl From<rmp_serde::encode::Error> for DomainError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        DomainError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for DomainError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        DomainError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Serialization(e.to_string())
    }
}
