//! # Dispute Lifecycle Manager
//!
//! [`DisputeManager`] is the sole mutator of stored disputes. Each mutating
//! call is one read-modify-append-write cycle against a [`RecordStore`]:
//!
//! 1. Load the collection and locate the dispute (`NotFound` if absent).
//! 2. Check the caller's pinned version, if any (`Conflict` on mismatch).
//! 3. Verify the audit chain (`AuditChain` if tampered).
//! 4. Apply the command to a clone. Rejections leave the store untouched.
//! 5. Re-read the collection; the stored version must still equal the one
//!    loaded in step 1 (`Conflict` otherwise).
//! 6. Write the updated clone in place and save.
//!
//! An internal mutex serializes callers sharing one manager. The re-read in
//! step 5 catches writers outside it, such as a second process on the same
//! [`FileStore`](dispute_store::FileStore).
//!
//! Reads never write. They return copies with `slaBreached` recomputed by
//! the configured [`SlaPolicy`].

use std::sync::Arc;

use parking_lot::Mutex;

use dispute_core::{Actor, Amount, Clock, ConsultantId, DisputeId, SystemClock, Timestamp};
use dispute_store::{RecordStore, StoreError};

use crate::command::DisputeCommand;
use crate::config::LedgerConfig;
use crate::dispute::{CommissionDispute, NewDispute};
use crate::error::{AuditError, DisputeError};
use crate::evidence::NewEvidence;
use crate::policy::{average_resolution_time, SlaAlert, SlaPolicy};
use crate::schema;
use crate::stats::DisputeStats;
use crate::status::{DisputeStatus, Resolution};

/// Lifecycle manager over a record store.
#[derive(Debug)]
pub struct DisputeManager<S> {
    store: S,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
    policy: SlaPolicy,
    write_lock: Mutex<()>,
}

impl<S: RecordStore> DisputeManager<S> {
    /// A manager with the system clock, default config, and default policy.
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config: LedgerConfig::default(),
            policy: SlaPolicy::default(),
            write_lock: Mutex::new(()),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the ledger configuration.
    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the SLA policy.
    pub fn with_policy(mut self, policy: SlaPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The active ledger configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The active SLA policy.
    pub fn policy(&self) -> &SlaPolicy {
        &self.policy
    }

    // -- Mutations ---------------------------------------------------------

    /// File a new dispute on behalf of `filed_by`.
    pub fn file_dispute(
        &self,
        filing: NewDispute,
        filed_by: &Actor,
    ) -> Result<CommissionDispute, DisputeError> {
        let _guard = self.write_lock.lock();
        let now = self.clock.now();
        let mut records = self.load_records()?;

        let dispute = loop {
            let candidate = match CommissionDispute::file(filing.clone(), filed_by, now) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(
                        consultant_id = %filing.consultant_id,
                        error = %e,
                        "dispute filing rejected"
                    );
                    return Err(e);
                }
            };
            if !records.iter().any(|d| d.id == candidate.id) {
                break candidate;
            }
        };

        records.push(dispute.clone());
        self.save_records(&records)?;
        tracing::info!(
            dispute_id = %dispute.id,
            consultant_id = %dispute.consultant_id,
            action = "file",
            status = %dispute.status,
            version = dispute.version,
            "dispute filed"
        );
        Ok(self.policy.refresh(&dispute, now))
    }

    /// Run `command` against dispute `id`.
    ///
    /// When `expected_version` is given the stored version must match it.
    /// Returns the updated, SLA-refreshed dispute.
    ///
    /// # Errors
    ///
    /// - [`DisputeError::NotFound`] if `id` is not stored.
    /// - [`DisputeError::Conflict`] if the stored version differs from
    ///   `expected_version`, or changed while the command was applied.
    /// - [`DisputeError::AuditChain`] if the stored trail fails verification.
    /// - Any error from the command itself. Nothing is written on error.
    pub fn execute(
        &self,
        id: &DisputeId,
        command: DisputeCommand,
        actor: &Actor,
        expected_version: Option<u64>,
    ) -> Result<CommissionDispute, DisputeError> {
        let _guard = self.write_lock.lock();
        let name = command.name();

        let records = self.load_records()?;
        let current = find(&records, id)?;
        if let Some(expected) = expected_version {
            if expected != current.version {
                tracing::warn!(
                    dispute_id = %id,
                    command = name,
                    expected_version = expected,
                    found_version = current.version,
                    "stale version on dispute command"
                );
                return Err(DisputeError::Conflict {
                    dispute_id: id.to_string(),
                    expected_version: expected,
                    found_version: current.version,
                });
            }
        }
        if let Err(source) = current.audit_trail.verify() {
            tracing::warn!(dispute_id = %id, command = name, error = %source, "audit chain broken");
            return Err(DisputeError::AuditChain {
                dispute_id: id.to_string(),
                source,
            });
        }

        let loaded_version = current.version;
        let mut updated = current.clone();
        let now = self.clock.now();
        if let Err(e) = command.apply(&mut updated, actor, now, self.config.comment_preview_len) {
            tracing::warn!(
                dispute_id = %id,
                command = name,
                status = %current.status,
                error = %e,
                "dispute command rejected"
            );
            return Err(e);
        }

        let mut fresh = self.load_records()?;
        let slot = find_mut(&mut fresh, id)?;
        if slot.version != loaded_version {
            tracing::warn!(
                dispute_id = %id,
                command = name,
                expected_version = loaded_version,
                found_version = slot.version,
                "concurrent write detected"
            );
            return Err(DisputeError::Conflict {
                dispute_id: id.to_string(),
                expected_version: loaded_version,
                found_version: slot.version,
            });
        }
        *slot = updated.clone();
        self.save_records(&fresh)?;

        tracing::info!(
            dispute_id = %id,
            action = name,
            status = %updated.status,
            version = updated.version,
            "dispute updated"
        );
        Ok(self.policy.refresh(&updated, now))
    }

    /// Move through a data-free transition.
    pub fn change_status(
        &self,
        id: &DisputeId,
        status: DisputeStatus,
        notes: Option<String>,
        actor: &Actor,
    ) -> Result<CommissionDispute, DisputeError> {
        self.execute(id, DisputeCommand::ChangeStatus { status, notes }, actor, None)
    }

    /// Assign or reassign a reviewer.
    pub fn assign(
        &self,
        id: &DisputeId,
        assignee: Actor,
        actor: &Actor,
    ) -> Result<CommissionDispute, DisputeError> {
        self.execute(id, DisputeCommand::Assign { assignee }, actor, None)
    }

    /// Attach evidence.
    pub fn add_evidence(
        &self,
        id: &DisputeId,
        evidence: NewEvidence,
        actor: &Actor,
    ) -> Result<CommissionDispute, DisputeError> {
        self.execute(id, DisputeCommand::AddEvidence(evidence), actor, None)
    }

    /// Post a comment.
    pub fn add_comment(
        &self,
        id: &DisputeId,
        comment: impl Into<String>,
        actor: &Actor,
        is_internal: bool,
    ) -> Result<CommissionDispute, DisputeError> {
        self.execute(
            id,
            DisputeCommand::AddComment {
                comment: comment.into(),
                is_internal,
            },
            actor,
            None,
        )
    }

    /// Resolve with an outcome.
    pub fn resolve(
        &self,
        id: &DisputeId,
        resolution: Resolution,
        notes: impl Into<String>,
        approved_amount: Option<Amount>,
        actor: &Actor,
    ) -> Result<CommissionDispute, DisputeError> {
        self.execute(
            id,
            DisputeCommand::Resolve {
                resolution,
                notes: notes.into(),
                approved_amount,
            },
            actor,
            None,
        )
    }

    /// Resolve with [`Resolution::Rejected`].
    pub fn reject(
        &self,
        id: &DisputeId,
        notes: impl Into<String>,
        actor: &Actor,
    ) -> Result<CommissionDispute, DisputeError> {
        self.resolve(id, Resolution::Rejected, notes, None, actor)
    }

    /// Escalate to a higher authority.
    pub fn escalate(
        &self,
        id: &DisputeId,
        escalated_to: Actor,
        reason: impl Into<String>,
        actor: &Actor,
    ) -> Result<CommissionDispute, DisputeError> {
        self.execute(
            id,
            DisputeCommand::Escalate {
                escalated_to,
                reason: reason.into(),
            },
            actor,
            None,
        )
    }

    // -- Reads -------------------------------------------------------------

    /// One dispute.
    pub fn get(&self, id: &DisputeId) -> Result<CommissionDispute, DisputeError> {
        let now = self.clock.now();
        let records = self.load_records()?;
        Ok(self.policy.refresh(find(&records, id)?, now))
    }

    /// Every dispute, in filing order.
    pub fn list(&self) -> Result<Vec<CommissionDispute>, DisputeError> {
        self.list_where(|_| true)
    }

    /// Disputes concerning one consultant.
    pub fn list_for_consultant(
        &self,
        consultant: &ConsultantId,
    ) -> Result<Vec<CommissionDispute>, DisputeError> {
        self.list_where(|d| &d.consultant_id == consultant)
    }

    /// Disputes in one status.
    pub fn list_by_status(
        &self,
        status: DisputeStatus,
    ) -> Result<Vec<CommissionDispute>, DisputeError> {
        self.list_where(|d| d.status == status)
    }

    /// Dashboard statistics, optionally for one consultant, with SLA flags
    /// evaluated now.
    pub fn stats(&self, consultant: Option<&ConsultantId>) -> Result<DisputeStats, DisputeError> {
        Ok(DisputeStats::collect(&self.list()?, consultant))
    }

    /// Open disputes that are breached or eligible for escalation now.
    pub fn sla_alerts(&self) -> Result<Vec<SlaAlert>, DisputeError> {
        let now = self.clock.now();
        let records = self.load_records()?;
        Ok(self.policy.alerts(&records, now))
    }

    /// Mean days from filing to resolution across the collection.
    pub fn average_resolution_time(&self) -> Result<i64, DisputeError> {
        Ok(average_resolution_time(&self.load_records()?))
    }

    /// Verify one dispute's audit chain.
    pub fn verify(&self, id: &DisputeId) -> Result<(), DisputeError> {
        let records = self.load_records()?;
        find(&records, id)?
            .audit_trail
            .verify()
            .map_err(|source| DisputeError::AuditChain {
                dispute_id: id.to_string(),
                source,
            })
    }

    /// Verify every audit chain. Returns the disputes that fail.
    pub fn verify_all(&self) -> Result<Vec<(DisputeId, AuditError)>, DisputeError> {
        let records = self.load_records()?;
        let failures: Vec<_> = records
            .iter()
            .filter_map(|d| d.audit_trail.verify().err().map(|e| (d.id, e)))
            .collect();
        tracing::debug!(
            checked = records.len(),
            failed = failures.len(),
            "verified audit chains"
        );
        Ok(failures)
    }

    // -- Store access ------------------------------------------------------

    fn list_where(
        &self,
        keep: impl Fn(&CommissionDispute) -> bool,
    ) -> Result<Vec<CommissionDispute>, DisputeError> {
        let now: Timestamp = self.clock.now();
        Ok(self
            .load_records()?
            .iter()
            .filter(|d| keep(d))
            .map(|d| self.policy.refresh(d, now))
            .collect())
    }

    fn load_records(&self) -> Result<Vec<CommissionDispute>, DisputeError> {
        let key = &self.config.collection_key;
        let Some(document) = self.store.load(key)? else {
            return Ok(Vec::new());
        };
        let decoded = schema::decode(document)?;
        if decoded.was_migrated() {
            tracing::info!(
                key = %key,
                from_version = decoded.source_version,
                to_version = schema::SCHEMA_VERSION,
                records = decoded.records.len(),
                "migrated dispute collection on read"
            );
        }
        Ok(decoded.records)
    }

    fn save_records(&self, records: &[CommissionDispute]) -> Result<(), DisputeError> {
        let key = &self.config.collection_key;
        let document = schema::encode(records).map_err(|source| StoreError::Serialization {
            key: key.clone(),
            source,
        })?;
        self.store.save(key, &document)?;
        Ok(())
    }
}

fn find<'a>(
    records: &'a [CommissionDispute],
    id: &DisputeId,
) -> Result<&'a CommissionDispute, DisputeError> {
    records
        .iter()
        .find(|d| d.id == *id)
        .ok_or_else(|| DisputeError::NotFound {
            dispute_id: id.to_string(),
        })
}

fn find_mut<'a>(
    records: &'a mut [CommissionDispute],
    id: &DisputeId,
) -> Result<&'a mut CommissionDispute, DisputeError> {
    records
        .iter_mut()
        .find(|d| d.id == *id)
        .ok_or_else(|| DisputeError::NotFound {
            dispute_id: id.to_string(),
        })
}
