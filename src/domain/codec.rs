//! Serialization helpers for `Base` implementors.
//!
//! The cache encoding is MessagePack with named fields, so adding an optional
//! field to an entity does not invalidate values already cached. The transport
//! encoding is plain JSON.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::DomainError;

pub fn encode_binary<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, DomainError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

pub fn decode_binary<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DomainError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String, DomainError> {
    Ok(serde_json::to_string(value)?)
}

pub fn to_dto_value<T: Serialize + ?Sized>(value: &T) -> Result<serde_json::Value, DomainError> {
    Ok(serde_json::to_value(value)?)
}

pub fn from_dto_value<T: DeserializeOwned>(dto: serde_json::Value) -> Result<T, DomainError> {
    Ok(serde_json::from_value(dto)?)
}
