//! # Canonical Serialization
//!
//! [`CanonicalBytes`] is the only input accepted by digest computation, so
//! every audit chain hash is computed over the same byte representation no
//! matter which process wrote or verified it.
//!
//! ## Coercion Rules
//!
//! 1. Reject floats. Amounts are integers.
//! 2. Normalize RFC 3339 strings to UTC with `Z` suffix. Sub-second digits
//!    are kept, so every stored instant hashes distinctly.
//!
//! After coercion the value is serialized with `serde_jcs` (RFC 8785): keys
//! sorted by UTF-16 code units, compact separators.

use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by canonicalization.
///
/// The inner `Vec<u8>` is private; construct only via [`CanonicalBytes::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::FloatRejected`] if the value contains
    /// a non-integer number, or [`CanonicalizationError::SerializationFailed`]
    /// if it cannot be serialized to JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let coerced = coerce_json_value(value)?;
        Ok(Self(serde_jcs::to_string(&coerced)?.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn coerce_json_value(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Number(n) => {
            if !n.is_i64() && !n.is_u64() {
                return Err(CanonicalizationError::FloatRejected(
                    n.as_f64().unwrap_or(f64::NAN),
                ));
            }
            Ok(Value::Number(n))
        }
        Value::Object(map) => {
            let mut coerced = serde_json::Map::new();
            for (k, v) in map {
                coerced.insert(k, coerce_json_value(v)?);
            }
            Ok(Value::Object(coerced))
        }
        Value::Array(arr) => {
            let coerced: Result<Vec<_>, _> = arr.into_iter().map(coerce_json_value).collect();
            Ok(Value::Array(coerced?))
        }
        Value::String(s) => {
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
                let utc = dt.with_timezone(&chrono::Utc);
                Ok(Value::String(utc.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            } else {
                Ok(Value::String(s))
            }
        }
        other => Ok(other),
    }
}
