//! Deterministic CBOR encoding of ledger records.
//!
//! Records are serde structs with a fixed field order and no maps keyed by
//! unordered collections, so `ciborium` emits the same bytes for the same
//! value on every platform. Content hashes are computed over these bytes;
//! a record that re-encodes differently would stop matching its vetted hash.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;

/// Encode a record to its canonical CBOR bytes.
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(record, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(buf)
}

/// Decode a record from CBOR bytes.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CoreError> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}
