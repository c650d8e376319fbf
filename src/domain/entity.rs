//! Entity contract
//!
//! `Base` is the capability set every persisted domain object implements. Generic
//! code only ever sees `Box<dyn Base>` / `&dyn Base`; the factory produces the
//! concrete type by domain name.
//!
//! The columns every entity shares live in [`BaseDomain`], which entities embed
//! and expose through `base()` / `base_mut()`:
//!
//! | column        | type                 | notes                              |
//! |---------------|----------------------|------------------------------------|
//! | `id`          | integer, primary key | assigned by the relational store   |
//! | `external_id` | text, unique         | assigned on first persistence      |
//! | `status`      | small integer        | `0 = active`, `1 = inactive`       |
//! | `created_at`  | text (RFC 3339)      |                                    |
//! | `updated_at`  | text (RFC 3339)      |                                    |
//! | `deleted_at`  | text (RFC 3339)      | `NULL` means not soft-deleted      |

use std::any::Any;
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sea_orm::{QueryResult, TryGetable, Value};
use serde::{Deserialize, Serialize};

use super::DomainError;

pub const COL_ID: &str = "id";
pub const COL_EXTERNAL_ID: &str = "external_id";
pub const COL_STATUS: &str = "status";
pub const COL_CREATED_AT: &str = "created_at";
pub const COL_UPDATED_AT: &str = "updated_at";
pub const COL_DELETED_AT: &str = "deleted_at";

/// Logical name of an entity type and of its backing table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainName(String);

impl DomainName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DomainName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for DomainName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for DomainName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Entity status. Stored as a small integer through a fixed lookup table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub fn code(self) -> i16 {
        match self {
            Status::Active => 0,
            Status::Inactive => 1,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, DomainError> {
        match code {
            0 => Ok(Status::Active),
            1 => Ok(Status::Inactive),
            other => Err(DomainError::Serialization(format!(
                "unknown status code {}",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Status::Active),
            "inactive" => Ok(Status::Inactive),
            other => Err(DomainError::Serialization(format!(
                "unknown status '{}'",
                other
            ))),
        }
    }
}

/// Columns shared by every entity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseDomain {
    pub id: u64,
    pub external_id: String,
    pub status: Status,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl BaseDomain {
    pub fn with_external_id(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            ..Default::default()
        }
    }

    /// Hydrate the shared columns from a raw row.
    pub fn from_row(row: &QueryResult) -> Result<Self, DomainError> {
        let id: i64 = column(row, COL_ID)?;
        let id = u64::try_from(id)
            .map_err(|_| DomainError::Serialization(format!("negative id {}", id)))?;
        let status: i16 = column(row, COL_STATUS)?;

        Ok(Self {
            id,
            external_id: column(row, COL_EXTERNAL_ID)?,
            status: Status::from_code(status)?,
            created_at: timestamp_column(row, COL_CREATED_AT)?,
            updated_at: timestamp_column(row, COL_UPDATED_AT)?,
            deleted_at: timestamp_column(row, COL_DELETED_AT)?,
        })
    }

    /// Values for the shared columns, `id` excluded (the store assigns it).
    pub fn sql_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            (COL_EXTERNAL_ID, self.external_id.clone().into()),
            (COL_STATUS, self.status.code().into()),
            (COL_CREATED_AT, format_timestamp(self.created_at).into()),
            (COL_UPDATED_AT, format_timestamp(self.updated_at).into()),
            (COL_DELETED_AT, format_timestamp(self.deleted_at).into()),
        ]
    }

    /// Overlay the populated shared fields of `delta`.
    ///
    /// `id`, `external_id` and `created_at` are never taken from the delta.
    /// `status` is taken only when the delta carries a non-default status
    /// (`Inactive`), so re-activating goes through a direct store update.
    /// `updated_at` and `deleted_at` are taken when the delta has them.
    pub fn merge_from(&mut self, delta: &BaseDomain) {
        if delta.status != Status::default() {
            self.status = delta.status;
        }
        if delta.updated_at.is_some() {
            self.updated_at = delta.updated_at;
        }
        if delta.deleted_at.is_some() {
            self.deleted_at = delta.deleted_at;
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Read one column, reporting a missing or mistyped column as a
/// serialization failure that names it.
pub fn column<T: TryGetable>(row: &QueryResult, name: &str) -> Result<T, DomainError> {
    row.try_get::<T>("", name)
        .map_err(|e| DomainError::Serialization(format!("column '{}': {}", name, e)))
}

fn timestamp_column(row: &QueryResult, name: &str) -> Result<Option<DateTime<Utc>>, DomainError> {
    let raw: Option<String> = column(row, name)?;
    raw.map(|s| parse_timestamp(name, &s)).transpose()
}

fn parse_timestamp(name: &str, raw: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DomainError::Serialization(format!("column '{}': {}", name, e)))
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Current time at the precision timestamps are stored with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Capability set of a persisted domain object.
///
/// Implementors must keep `merge` idempotent: applying the same delta twice
/// leaves the entity as applying it once. Which side wins on a field
/// collision is each entity's documented choice.
pub trait Base: Send + Sync + fmt::Debug + 'static {
    fn base(&self) -> &BaseDomain;

    fn base_mut(&mut self) -> &mut BaseDomain;

    /// Domain name, which is also the table the entity lives in.
    fn table(&self) -> DomainName;

    /// Transport (JSON-compatible) representation.
    fn to_dto(&self) -> Result<serde_json::Value, DomainError>;

    /// Build a new entity of this type from its transport representation.
    fn from_dto(&self, dto: serde_json::Value) -> Result<Box<dyn Base>, DomainError>;

    /// Overlay the populated fields of `delta`. A delta of another concrete
    /// type is a serialization error.
    fn merge(&mut self, delta: &dyn Base) -> Result<(), DomainError>;

    /// Hydrate a new entity of this type from a raw row.
    fn from_sql_row(&self, row: &QueryResult) -> Result<Box<dyn Base>, DomainError>;

    /// Domain-specific columns to persist, shared columns excluded.
    fn sql_values(&self) -> Vec<(&'static str, Value)>;

    fn marshal_binary(&self) -> Result<Vec<u8>, DomainError>;

    fn unmarshal_binary(&mut self, bytes: &[u8]) -> Result<(), DomainError>;

    fn to_json(&self) -> Result<String, DomainError>;

    fn clone_box(&self) -> Box<dyn Base>;

    fn as_any(&self) -> &dyn Any;

    fn external_id(&self) -> &str {
        &self.base().external_id
    }

    fn set_external_id(&mut self, external_id: String) {
        self.base_mut().external_id = external_id;
    }

    fn id(&self) -> u64 {
        self.base().id
    }

    fn status(&self) -> Status {
        self.base().status
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.base().created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.base().updated_at
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.base().deleted_at
    }
}

impl dyn Base {
    pub fn downcast_ref<T: Base>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Base>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl Clone for Box<dyn Base> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl fmt::Display for dyn Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{}({})", self.table(), self.external_id()),
        }
    }
}

/// Downcast a merge delta to the receiver's concrete type.
pub fn expect_delta<'a, T: Base>(
    receiver: &T,
    delta: &'a dyn Base,
) -> Result<&'a T, DomainError> {
    delta.downcast_ref::<T>().ok_or_else(|| {
        DomainError::Serialization(format!(
            "cannot merge {} delta into {}",
            delta.table(),
            receiver.table()
        ))
    })
}
