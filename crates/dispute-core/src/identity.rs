//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers in the dispute ledger.
//!
//! ## Validation
//!
//! UUID-based identifiers ([`DisputeId`], [`EvidenceId`], [`CommentId`],
//! [`AuditEntryId`]) are always valid by construction. String-based
//! identifiers ([`UserId`], [`ConsultantId`]) are trimmed and must be
//! non-empty; deserialization routes through the same constructor so an
//! invalid value in a stored blob is rejected rather than silently accepted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Implements the standard surface of a UUID-backed identifier.
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $ty:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $ty(Uuid);

        impl $ty {
            #[doc = concat!("Create a new random ", $label, " identifier.")]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $ty {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

/// Routes string newtype deserialization through `new()`.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// UUID-based identifiers
// ---------------------------------------------------------------------------

uuid_identifier!(
    /// The identity of a commission dispute. Assigned once at filing and
    /// never reused.
    DisputeId,
    "dispute"
);

uuid_identifier!(
    /// Identifies one evidence attachment within a dispute.
    EvidenceId,
    "evidence"
);

uuid_identifier!(
    /// Identifies one comment within a dispute.
    CommentId,
    "comment"
);

uuid_identifier!(
    /// Identifies one audit entry within a dispute's trail.
    AuditEntryId,
    "audit entry"
);

impl DisputeId {
    /// Parse a dispute identifier from either the bare UUID or the
    /// `dispute:`-prefixed form produced by `Display`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let raw = s.trim();
        let raw = raw.strip_prefix("dispute:").unwrap_or(raw);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| ValidationError::InvalidIdentifier {
                kind: "dispute id",
                value: s.to_string(),
            })
    }
}

impl std::fmt::Display for DisputeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&format!("dispute:{}", self.0))
    }
}

impl std::fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// String-based identifiers
// ---------------------------------------------------------------------------

/// A user of the dashboard: filer, assignee, reviewer, or commenter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserId(String);

impl UserId {
    /// Create a user identifier. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentifier`] if the value is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = id.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidIdentifier {
                kind: "user id",
                value: raw,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl_validating_deserialize!(UserId);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// The consultant whose commission is being disputed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConsultantId(String);

impl ConsultantId {
    /// Create a consultant identifier. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentifier`] if the value is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = id.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidIdentifier {
                kind: "consultant id",
                value: raw,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl_validating_deserialize!(ConsultantId);

impl std::fmt::Display for ConsultantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// Whoever performs an operation; recorded on every audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Stable user identifier.
    pub user_id: UserId,
    /// Display name at the time of the action.
    pub user_name: String,
}

impl Actor {
    /// Build an actor from a raw user id and display name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentifier`] if `user_id` is blank.
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            user_id: UserId::new(user_id)?,
            user_name: user_name.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_honours_width() {
        let id = DisputeId::new();
        let shown = id.to_string();
        assert_eq!(format!("{id:<50}").trim_end(), shown);
        assert_eq!(format!("{id:<50}").len(), 50);
        let c = ConsultantId::new("c-12").unwrap();
        assert_eq!(format!("{c:<8}|"), "c-12    |");
    }

    #[test]
    fn dispute_id_parses_both_forms() {
        let id = DisputeId::new();
        assert_eq!(DisputeId::parse(&id.to_string()).unwrap(), id);
        assert_eq!(DisputeId::parse(&id.as_uuid().to_string()).unwrap(), id);
    }

    #[test]
    fn dispute_id_rejects_garbage() {
        assert!(DisputeId::parse("dispute:not-a-uuid").is_err());
    }

    #[test]
    fn dispute_id_serializes_as_bare_uuid() {
        let id = DisputeId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }

    #[test]
    fn user_id_is_trimmed() {
        assert_eq!(UserId::new("  agent-7 ").unwrap().as_str(), "agent-7");
    }

    #[test]
    fn blank_user_id_rejected() {
        assert!(UserId::new("   ").is_err());
    }

    #[test]
    fn blank_consultant_id_rejected_on_deserialize() {
        let result: Result<ConsultantId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn fresh_ids_are_distinct() {
        assert_ne!(AuditEntryId::new(), AuditEntryId::new());
    }
}
