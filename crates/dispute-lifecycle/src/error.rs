//! # Lifecycle Error Types
//!
//! [`DisputeError`] is the boundary error of the lifecycle manager. Every
//! not-found, validation, and state machine condition is converted into one
//! of its variants before it reaches a caller; store failures pass through
//! unchanged inside [`DisputeError::Store`].

use dispute_core::{CanonicalizationError, ValidationError};
use dispute_store::StoreError;
use thiserror::Error;

/// Errors arising from dispute lifecycle operations.
#[derive(Error, Debug)]
pub enum DisputeError {
    /// The referenced dispute does not exist in the store.
    #[error("dispute {dispute_id} not found")]
    NotFound {
        /// The identifier that was looked up.
        dispute_id: String,
    },

    /// A required field was missing or malformed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The transition is not in the state machine's table.
    #[error("illegal transition for dispute {dispute_id} from {from} to {to}: {reason}")]
    IllegalTransition {
        /// The dispute identifier.
        dispute_id: String,
        /// The current status.
        from: String,
        /// The attempted target status.
        to: String,
        /// Human-readable reason for the rejection.
        reason: String,
    },

    /// The dispute is resolved or rejected and accepts no further transitions.
    #[error("dispute {dispute_id} is in terminal state {state}")]
    TerminalState {
        /// The dispute identifier.
        dispute_id: String,
        /// The terminal status.
        state: String,
    },

    /// The stored record changed between read and write.
    #[error("write conflict on dispute {dispute_id}: expected version {expected_version}, found {found_version}")]
    Conflict {
        /// The dispute identifier.
        dispute_id: String,
        /// The version the caller read or pinned.
        expected_version: u64,
        /// The version currently in the store.
        found_version: u64,
    },

    /// The audit trail failed tamper-evidence verification.
    #[error("audit trail of dispute {dispute_id} failed verification: {source}")]
    AuditChain {
        /// The dispute identifier.
        dispute_id: String,
        /// What was wrong with the chain.
        #[source]
        source: AuditError,
    },

    /// The persisted collection could not be read in any supported schema.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The record store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An audit entry could not be canonicalized for hashing.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl DisputeError {
    /// Whether the ledger refused the request, as opposed to failing to
    /// read or write it.
    ///
    /// Rejections are not-found, validation, state machine, conflict, and
    /// broken-chain errors. Store, schema, and canonicalization failures are
    /// not.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Validation(_)
                | Self::IllegalTransition { .. }
                | Self::TerminalState { .. }
                | Self::Conflict { .. }
                | Self::AuditChain { .. }
        )
    }
}

/// Tamper-evidence failures in an audit trail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// A dispute must always carry at least its creation entry.
    #[error("audit trail is empty")]
    Empty,

    /// The first entry is not the creation entry.
    #[error("entry 0 has action {action}, expected dispute_created")]
    MissingCreationEntry {
        /// The action found at index 0.
        action: String,
    },

    /// An entry's `previousHash` does not equal the preceding `entryHash`.
    #[error("entry {index} is not linked to its predecessor")]
    BrokenLink {
        /// Index of the offending entry.
        index: usize,
    },

    /// An entry's stored hash does not match its recomputed content hash.
    #[error("entry {index} hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch {
        /// Index of the offending entry.
        index: usize,
        /// The stored `entryHash`.
        stored: String,
        /// The recomputed hash.
        computed: String,
    },

    /// An entry is timestamped before its predecessor.
    #[error("entry {index} timestamp precedes entry {}", .index - 1)]
    TimestampRegression {
        /// Index of the offending entry.
        index: usize,
    },

    /// Two entries share an id.
    #[error("entry {index} reuses an earlier entry id")]
    DuplicateId {
        /// Index of the offending entry.
        index: usize,
    },

    /// An entry could not be canonicalized for hashing.
    #[error("entry {index} could not be canonicalized: {reason}")]
    Canonicalization {
        /// Index of the offending entry.
        index: usize,
        /// The canonicalization failure.
        reason: String,
    },
}

/// Failures reading the persisted collection envelope.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The document was written by a newer release.
    #[error("unsupported schema version {found} (this build reads up to {supported})")]
    UnsupportedVersion {
        /// The version found in the document.
        found: u64,
        /// The newest version this build understands.
        supported: u64,
    },

    /// The document is neither an envelope nor a legacy array.
    #[error("malformed collection document: {0}")]
    Malformed(String),

    /// A current-schema record does not deserialize.
    #[error("record {index} is invalid: {source}")]
    InvalidRecord {
        /// Position of the record in the collection.
        index: usize,
        /// The deserialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// A legacy record cannot be carried into the current schema.
    #[error("legacy record {index} cannot be migrated: {reason}")]
    Unmigratable {
        /// Position of the record in the collection.
        index: usize,
        /// Why migration failed.
        reason: String,
    },
}
