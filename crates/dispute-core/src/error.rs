//! # Error Hierarchy
//!
//! Structured error types for the domain primitives, built with `thiserror`.
//! Each variant carries the offending input so callers can report it
//! without re-deriving context.

use thiserror::Error;

/// Validation errors for domain primitives and required fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or blank.
    #[error("missing required field: {field}")]
    MissingField {
        /// The field name as it appears in the persisted shape.
        field: &'static str,
    },

    /// Amounts must be non-negative counts of minor currency units.
    #[error("invalid amount {0}: must be a non-negative integer of minor units")]
    InvalidAmount(i64),

    /// A string identifier failed format validation.
    #[error("invalid {kind}: \"{value}\"")]
    InvalidIdentifier {
        /// Which identifier type rejected the input.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Timestamp string is not valid RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_the_field() {
        let err = ValidationError::MissingField { field: "reason" };
        assert_eq!(format!("{err}"), "missing required field: reason");
    }

    #[test]
    fn invalid_identifier_display() {
        let err = ValidationError::InvalidIdentifier {
            kind: "user id",
            value: "  ".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("user id"));
    }

    #[test]
    fn float_rejected_display() {
        let err = CanonicalizationError::FloatRejected(1.5);
        assert!(format!("{err}").contains("1.5"));
    }
}
