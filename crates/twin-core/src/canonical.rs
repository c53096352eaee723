//! # Canonical Serialization
//!
//! [`CanonicalBytes`] is the only input [`sha256_digest()`](crate::sha256_digest)
//! accepts. Construction goes through `serde_json::Value` with object keys
//! re-sorted, so the same record always produces the same bytes regardless
//! of struct field order.
//!
//! Rules:
//!
//! 1. Floats are rejected. Weights, costs and dimensions are integers.
//! 2. Object keys are sorted lexicographically, independent of whether
//!    `serde_json` was built with `preserve_order`.
//! 3. Output is compact (no whitespace).

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced by canonical serialization. The inner buffer is private.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        Ok(Self(serde_json::to_vec(&sort_keys(value))?))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume and return the inner buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Number(n) if n.is_f64() => Err(CanonicalizationError::FloatRejected(
            n.as_f64().unwrap_or(f64::NAN),
        )),
        Value::Array(items) => items.iter().try_for_each(reject_floats),
        Value::Object(map) => map.values().try_for_each(reject_floats),
        _ => Ok(()),
    }
}
