// lib/src/storage_engine/storage_utils.rs

use bincode::config::{self, BigEndian, Configuration, Fixint};
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{ClaimsError, Result};

/// Provides a standard bincode configuration.
pub fn bincode_config() -> Configuration<BigEndian, Fixint> {
    config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
}

/// Helper to serialize a record to bytes using bincode.
pub fn serialize_record<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    Ok(encode_to_vec(record, bincode_config())?)
}

/// Helper to deserialize bytes to a record using bincode.
pub fn deserialize_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (record, _): (T, usize) = decode_from_slice(bytes, bincode_config())?;
    Ok(record)
}

/// Big-endian key for a surrogate id, so sled iterates rows in id order.
pub fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Key of a child row: the parent claim's id followed by the row's own id.
/// A prefix scan on the parent yields its children in id order.
pub fn child_key(parent: u64, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&parent.to_be_bytes());
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Key for the business identifier index. The sign bit is flipped so that
/// negative identifiers still sort before positive ones.
pub fn business_id_key(claim_id: i64) -> [u8; 8] {
    ((claim_id as u64) ^ (1 << 63)).to_be_bytes()
}

pub fn parse_id(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| ClaimsError::SerializationError(format!("expected an 8 byte id, found {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(raw))
}
