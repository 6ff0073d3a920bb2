//! # Canonical Serialization: JCS-Compatible Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! that are hashed into card identifiers or covered by card signatures.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private. The only way to construct `CanonicalBytes`
//! is through `CanonicalBytes::new()`, which rejects floats and then
//! serializes with RFC 8785 (JSON Canonicalization Scheme) rules: sorted keys,
//! compact separators, deterministic number formatting.
//!
//! Two parties that agree on a card's content therefore agree on its bytes,
//! its identifier, and the message every signer signed. Any function that
//! hashes or verifies card content accepts `&CanonicalBytes`, so a
//! non-canonical serialization path cannot reach those functions.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - All numbers are integers; floats are rejected.
/// - Object keys are sorted, separators are compact (RFC 8785).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains a
    /// non-integer number. Returns `CanonicalizationError::SerializationFailed`
    /// if the value cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let bytes = serde_jcs::to_string(&value)?.into_bytes();
        Ok(Self(bytes))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Walk the value tree and fail on the first non-integer number.
fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Number(n) if n.is_f64() => {
            Err(CanonicalizationError::FloatRejected(n.as_f64().unwrap_or(f64::NAN)))
        }
        Value::Object(map) => map.values().try_for_each(reject_floats),
        Value::Array(arr) => arr.iter().try_for_each(reject_floats),
        _ => Ok(()),
    }
}
