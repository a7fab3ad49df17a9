#![deny(missing_docs)]

//! # dispute-lifecycle: Commission Dispute Lifecycle and Audit Ledger
//!
//! A commission dispute moves through a small state machine
//! (`open → under-review → resolved | rejected | escalated`), accumulates
//! evidence and comments, and keeps a tamper-evident, append-only history of
//! every mutation.
//!
//! ## Components
//!
//! - [`status`]: the transition table. Every mutating entry point consults
//!   it; illegal moves fail with [`DisputeError::IllegalTransition`] and
//!   moves out of a terminal state with [`DisputeError::TerminalState`].
//! - [`audit`]: the Audit Ledger. [`AuditTrail`] appends one hash-chained
//!   [`AuditEntry`] per mutation and can verify the whole chain.
//! - [`dispute`]: the [`CommissionDispute`] aggregate and its guarded
//!   operations.
//! - [`policy`]: the SLA / Policy Evaluator.
//! - [`stats`]: the Stats Aggregator behind dashboard cards.
//! - [`schema`]: the versioned persisted envelope and legacy migration.
//! - [`manager`]: [`DisputeManager`], the load-mutate-save cycle over a
//!   [`RecordStore`](dispute_store::RecordStore) with optimistic version
//!   checks.
//!
//! ## Example
//!
//! ```
//! use dispute_core::{Actor, Amount, ConsultantId};
//! use dispute_lifecycle::{DisputeManager, DisputeStatus, NewDispute, Resolution};
//! use dispute_store::MemoryStore;
//!
//! let manager = DisputeManager::new(MemoryStore::new());
//! let filer = Actor::new("consultant-12", "Riley").unwrap();
//! let agent = Actor::new("agent-7", "Agent Seven").unwrap();
//!
//! let dispute = manager
//!     .file_dispute(
//!         NewDispute::complete(
//!             ConsultantId::new("consultant-12").unwrap(),
//!             "Placement fee not credited",
//!             Amount::new(5000).unwrap(),
//!             Amount::new(6000).unwrap(),
//!         ),
//!         &filer,
//!     )
//!     .unwrap();
//! manager.assign(&dispute.id, agent.clone(), &agent).unwrap();
//! let resolved = manager
//!     .resolve(
//!         &dispute.id,
//!         Resolution::ApprovedPartial,
//!         "Split was 50/50",
//!         Some(Amount::new(5500).unwrap()),
//!         &agent,
//!     )
//!     .unwrap();
//!
//! assert_eq!(resolved.status, DisputeStatus::Resolved);
//! assert_eq!(resolved.audit_trail.len(), 3);
//! ```

pub mod audit;
pub mod command;
pub mod config;
pub mod dispute;
pub mod error;
pub mod evidence;
pub mod manager;
pub mod policy;
pub mod schema;
pub mod stats;
pub mod status;

pub use audit::{AuditAction, AuditDraft, AuditEntry, AuditRecord, AuditTrail};
pub use command::DisputeCommand;
pub use config::LedgerConfig;
pub use dispute::{CommissionDispute, NewDispute};
pub use error::{AuditError, DisputeError, SchemaError};
pub use evidence::{DisputeComment, DisputeEvidence, NewEvidence};
pub use manager::DisputeManager;
pub use policy::{
    average_resolution_time, business_days_between, SlaAlert, SlaAlertReason, SlaAssessment,
    SlaPolicy,
};
pub use schema::SCHEMA_VERSION;
pub use stats::{DisputeStats, StatusCounts};
pub use status::{DisputeStatus, Resolution};
