#![deny(missing_docs)]

//! # dispute-core: Foundational Types for the Commission Dispute Ledger
//!
//! Every other crate in the workspace depends on the types defined here.
//! This crate has no internal dependencies.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A [`DisputeId`] cannot be
//!    passed where an [`EvidenceId`] is expected, and a [`UserId`] cannot be
//!    confused with a [`ConsultantId`].
//!
//! 2. **Money is never a float.** [`Amount`] counts minor currency units as a
//!    non-negative integer.
//!
//! 3. **[`CanonicalBytes`] is the sole path to digest computation.** Audit
//!    chain hashes are computed over canonical JSON only.
//!
//! 4. **Time is injectable.** Code that needs "now" takes a [`Clock`], so
//!    tests can pin and advance time with [`ManualClock`].

pub mod amount;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use amount::Amount;
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, ZERO_HASH_HEX};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{Actor, AuditEntryId, CommentId, ConsultantId, DisputeId, EvidenceId, UserId};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
