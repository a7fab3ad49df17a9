//! # Commission Dispute Aggregate
//!
//! [`CommissionDispute`] is the aggregate root: the record together with its
//! evidence, comments, and audit trail, treated as one unit of consistency.
//!
//! ## Design Choice: Validated Enum over Typestate
//!
//! Disputes are loaded from a JSON store where the status is only known at
//! runtime, and several operations (evidence, comments, resolution) apply
//! from more than one status. The status is therefore a serde-friendly
//! [`DisputeStatus`] enum checked against its transition table on every
//! call, and each transition has a dedicated method taking exactly the data
//! that transition needs.
//!
//! ## Invariants
//!
//! - Every successful mutation appends exactly one audit entry and bumps
//!   `version` by one. Failed mutations leave the aggregate untouched.
//! - `approved_amount` is `Some` if and only if `status == Resolved`.
//! - `assigned_date`, `escalated_date`, and `resolved_date` are written on
//!   first entry into their state and never overwritten.
//! - Terminal disputes reject `change_status`, `assign`, `escalate`, and
//!   `resolve`.

use serde::{Deserialize, Serialize};
use serde_json::json;

use dispute_core::{
    Actor, Amount, CommentId, ConsultantId, DisputeId, EvidenceId, Timestamp, UserId,
    ValidationError,
};

use crate::audit::{AuditAction, AuditDraft, AuditTrail};
use crate::error::DisputeError;
use crate::evidence::{preview, DisputeComment, DisputeEvidence, NewEvidence};
use crate::status::{check_transition, DisputeStatus, Resolution};

/// Caller-supplied fields for filing a dispute, as they arrive from a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDispute {
    /// The consultant whose commission is disputed.
    pub consultant_id: ConsultantId,
    /// Why the commission is disputed. Required.
    pub reason: Option<String>,
    /// The amount in dispute. Required.
    pub disputed_amount: Option<Amount>,
    /// The amount the filer expected. Required.
    pub expected_amount: Option<Amount>,
}

impl NewDispute {
    /// A filing with every required field present.
    pub fn complete(
        consultant_id: ConsultantId,
        reason: impl Into<String>,
        disputed_amount: Amount,
        expected_amount: Amount,
    ) -> Self {
        Self {
            consultant_id,
            reason: Some(reason.into()),
            disputed_amount: Some(disputed_amount),
            expected_amount: Some(expected_amount),
        }
    }
}

/// Reject absent or whitespace-only free text.
fn require_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ValidationError::MissingField { field }),
    }
}

/// A commission dispute and its full history.
///
/// Created via [`CommissionDispute::file`], then mutated only through the
/// transition and attachment methods below. The persisted JSON shape uses
/// camelCase field names and omits absent optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionDispute {
    /// Unique dispute identifier.
    pub id: DisputeId,
    /// The consultant whose commission is disputed.
    pub consultant_id: ConsultantId,
    /// Who filed the dispute.
    pub filed_by: UserId,
    /// Display name of the filer.
    pub filed_by_name: String,
    /// When the dispute was filed.
    pub filed_date: Timestamp,
    /// Why the commission is disputed.
    pub reason: String,
    /// The amount in dispute.
    pub disputed_amount: Amount,
    /// The amount the filer expected.
    pub expected_amount: Amount,
    /// Current lifecycle status.
    pub status: DisputeStatus,

    /// Current reviewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    /// Display name of the current reviewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_name: Option<String>,
    /// When the dispute was first assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_date: Option<Timestamp>,

    /// Evidence attachments in upload order.
    #[serde(default)]
    pub evidence: Vec<DisputeEvidence>,
    /// Comments in posting order.
    #[serde(default)]
    pub comments: Vec<DisputeComment>,
    /// Append-only, hash-chained history of every mutation.
    pub audit_trail: AuditTrail,

    /// The resolution outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    /// Reviewer's notes on the resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,
    /// The approved payout. Present iff `status == resolved`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_amount: Option<Amount>,
    /// Who resolved the dispute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<UserId>,
    /// Display name of who resolved the dispute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by_name: Option<String>,
    /// When the dispute was resolved or rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_date: Option<Timestamp>,

    /// Who the dispute was escalated to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated_to: Option<UserId>,
    /// Display name of who the dispute was escalated to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated_to_name: Option<String>,
    /// When the dispute was first escalated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated_date: Option<Timestamp>,
    /// Why the dispute was escalated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,

    /// Derived by the SLA policy on read; not maintained by mutations.
    #[serde(default)]
    pub sla_breached: bool,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record was last mutated.
    pub updated_at: Timestamp,
    /// Optimistic concurrency counter: 0 at filing, +1 per mutation.
    #[serde(default)]
    pub version: u64,
}

impl CommissionDispute {
    /// File a new dispute in [`DisputeStatus::Open`].
    ///
    /// The dispute starts with empty evidence and comments and a single
    /// `dispute_created` audit entry.
    ///
    /// # Errors
    ///
    /// Returns [`DisputeError::Validation`] if `reason`, `disputed_amount`,
    /// or `expected_amount` is absent.
    pub fn file(filing: NewDispute, filed_by: &Actor, now: Timestamp) -> Result<Self, DisputeError> {
        let reason = require_text(filing.reason, "reason")?;
        let disputed_amount = filing
            .disputed_amount
            .ok_or(ValidationError::MissingField {
                field: "disputedAmount",
            })?;
        let expected_amount = filing
            .expected_amount
            .ok_or(ValidationError::MissingField {
                field: "expectedAmount",
            })?;

        let id = DisputeId::new();
        let mut audit_trail = AuditTrail::new();
        audit_trail.append(
            AuditDraft::new(
                AuditAction::DisputeCreated,
                json!({
                    "disputeId": id.as_uuid().to_string(),
                    "consultantId": filing.consultant_id.as_str(),
                    "reason": reason,
                    "disputedAmount": disputed_amount.minor_units(),
                    "expectedAmount": expected_amount.minor_units(),
                }),
            ),
            filed_by,
            now,
        )?;

        Ok(Self {
            id,
            consultant_id: filing.consultant_id,
            filed_by: filed_by.user_id.clone(),
            filed_by_name: filed_by.user_name.clone(),
            filed_date: now,
            reason,
            disputed_amount,
            expected_amount,
            status: DisputeStatus::Open,
            assigned_to: None,
            assigned_to_name: None,
            assigned_date: None,
            evidence: Vec::new(),
            comments: Vec::new(),
            audit_trail,
            resolution: None,
            resolution_notes: None,
            approved_amount: None,
            resolved_by: None,
            resolved_by_name: None,
            resolved_date: None,
            escalated_to: None,
            escalated_to_name: None,
            escalated_date: None,
            escalation_reason: None,
            sla_breached: false,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Move through a transition that carries no data of its own:
    /// `open → under-review` or `escalated → under-review`.
    ///
    /// Resolution, rejection, and escalation need their own fields and are
    /// only reachable through [`resolve`](Self::resolve) and
    /// [`escalate`](Self::escalate).
    ///
    /// # Errors
    ///
    /// [`DisputeError::TerminalState`] from a terminal status;
    /// [`DisputeError::IllegalTransition`] for any other move not in the table
    /// or a target that requires a dedicated operation.
    pub fn change_status(
        &mut self,
        to: DisputeStatus,
        notes: Option<String>,
        actor: &Actor,
        now: Timestamp,
    ) -> Result<(), DisputeError> {
        let from = self.status;
        if !from.is_terminal() {
            let dedicated = match to {
                DisputeStatus::Resolved | DisputeStatus::Rejected => Some("resolve"),
                DisputeStatus::Escalated => Some("escalate"),
                DisputeStatus::Open | DisputeStatus::UnderReview => None,
            };
            if let Some(operation) = dedicated {
                return Err(DisputeError::IllegalTransition {
                    dispute_id: self.id.to_string(),
                    from: from.as_str().to_string(),
                    to: to.as_str().to_string(),
                    reason: format!("{to} must be entered through {operation}"),
                });
            }
        }
        check_transition(&self.id, from, to)?;

        let mut details = json!({});
        if let Some(text) = notes.as_deref().filter(|t| !t.trim().is_empty()) {
            details["notes"] = json!(text);
        }
        self.record(
            AuditDraft::new(AuditAction::StatusChanged, details)
                .with_change(from.as_str(), to.as_str()),
            actor,
            now,
        )?;
        self.status = to;
        Ok(())
    }

    /// Assign a reviewer.
    ///
    /// From `open` or `escalated` this also moves the dispute to
    /// `under-review`; from `under-review` it is a reassignment. The first
    /// assignment sets `assigned_date`.
    ///
    /// # Errors
    ///
    /// [`DisputeError::TerminalState`] if the dispute is resolved or rejected.
    pub fn assign(&mut self, assignee: &Actor, actor: &Actor, now: Timestamp) -> Result<(), DisputeError> {
        let from = self.status;
        let to = DisputeStatus::UnderReview;
        if from != to {
            check_transition(&self.id, from, to)?;
        }

        let mut details = json!({
            "assignedTo": assignee.user_id.as_str(),
            "assignedToName": assignee.user_name,
        });
        if let Some(previous) = &self.assigned_to {
            details["previousAssignee"] = json!(previous.as_str());
        }
        let mut draft = AuditDraft::new(AuditAction::Assigned, details);
        if from != to {
            draft = draft.with_change(from.as_str(), to.as_str());
        }
        self.record(draft, actor, now)?;

        self.assigned_to = Some(assignee.user_id.clone());
        self.assigned_to_name = Some(assignee.user_name.clone());
        self.assigned_date.get_or_insert(now);
        self.status = to;
        Ok(())
    }

    /// Attach an evidence file. Accepted in every status.
    ///
    /// The audit entry carries the file name and a preview of the
    /// description, truncated to `preview_len` characters.
    ///
    /// # Errors
    ///
    /// [`DisputeError::Validation`] if the file name is blank.
    pub fn add_evidence(
        &mut self,
        evidence: NewEvidence,
        actor: &Actor,
        now: Timestamp,
        preview_len: usize,
    ) -> Result<EvidenceId, DisputeError> {
        let file_name = require_text(Some(evidence.file_name), "fileName")?;
        let id = EvidenceId::new();
        self.record(
            AuditDraft::new(
                AuditAction::EvidenceAdded,
                json!({
                    "evidenceId": id.as_uuid().to_string(),
                    "fileName": file_name,
                    "descriptionPreview": preview(&evidence.description, preview_len),
                }),
            ),
            actor,
            now,
        )?;
        self.evidence.push(DisputeEvidence {
            id,
            file_name,
            description: evidence.description,
            uploaded_by: actor.user_id.clone(),
            uploaded_at: now,
        });
        Ok(id)
    }

    /// Post a comment. Accepted in every status.
    ///
    /// The full text is kept on the comment; the audit entry stores only the
    /// first `preview_len` characters as `commentPreview`.
    ///
    /// # Errors
    ///
    /// [`DisputeError::Validation`] if the comment is blank.
    pub fn add_comment(
        &mut self,
        comment: String,
        is_internal: bool,
        actor: &Actor,
        now: Timestamp,
        preview_len: usize,
    ) -> Result<CommentId, DisputeError> {
        let comment = require_text(Some(comment), "comment")?;
        let id = CommentId::new();
        self.record(
            AuditDraft::new(
                AuditAction::CommentAdded,
                json!({
                    "commentId": id.as_uuid().to_string(),
                    "commentPreview": preview(&comment, preview_len),
                    "commentLength": comment.chars().count(),
                    "isInternal": is_internal,
                }),
            ),
            actor,
            now,
        )?;
        self.comments.push(DisputeComment {
            id,
            user_id: actor.user_id.clone(),
            user_name: actor.user_name.clone(),
            comment,
            is_internal,
            created_at: now,
        });
        Ok(id)
    }

    /// Close the dispute with an outcome.
    ///
    /// Approval outcomes move to `resolved` and record `approved_amount`
    /// exactly as given, even when it differs from both the disputed and
    /// expected amounts. [`Resolution::Rejected`] moves to `rejected`.
    ///
    /// # Errors
    ///
    /// - [`DisputeError::TerminalState`] if already resolved or rejected.
    /// - [`DisputeError::IllegalTransition`] unless `under-review` or
    ///   `escalated`.
    /// - [`DisputeError::Validation`] if notes are blank, an approval has no
    ///   amount, or a rejection carries one.
    pub fn resolve(
        &mut self,
        resolution: Resolution,
        notes: String,
        approved_amount: Option<Amount>,
        actor: &Actor,
        now: Timestamp,
    ) -> Result<(), DisputeError> {
        let from = self.status;
        let to = resolution.target_status();
        check_transition(&self.id, from, to)?;

        let notes = require_text(Some(notes), "resolutionNotes")?;
        let approved_amount = match (to, approved_amount) {
            (DisputeStatus::Resolved, Some(amount)) => Some(amount),
            (DisputeStatus::Resolved, None) => {
                return Err(ValidationError::MissingField {
                    field: "approvedAmount",
                }
                .into())
            }
            (_, Some(amount)) => {
                return Err(ValidationError::InvalidAmount(amount.minor_units()).into())
            }
            (_, None) => None,
        };

        self.record(
            AuditDraft::new(
                AuditAction::DisputeResolved,
                json!({
                    "resolution": resolution.as_str(),
                    "approvedAmount": approved_amount.map(|a| a.minor_units()),
                    "disputedAmount": self.disputed_amount.minor_units(),
                    "expectedAmount": self.expected_amount.minor_units(),
                    "status": to.as_str(),
                }),
            )
            .with_change(from.as_str(), to.as_str()),
            actor,
            now,
        )?;

        self.status = to;
        self.resolution = Some(resolution);
        self.resolution_notes = Some(notes);
        self.approved_amount = approved_amount;
        self.resolved_by = Some(actor.user_id.clone());
        self.resolved_by_name = Some(actor.user_name.clone());
        self.resolved_date.get_or_insert(now);
        Ok(())
    }

    /// Escalate an `under-review` dispute to a higher authority.
    ///
    /// The first escalation sets `escalated_date`; later escalations replace
    /// the target and reason.
    ///
    /// # Errors
    ///
    /// - [`DisputeError::TerminalState`] if resolved or rejected.
    /// - [`DisputeError::IllegalTransition`] unless `under-review`.
    /// - [`DisputeError::Validation`] if the reason is blank.
    pub fn escalate(
        &mut self,
        escalated_to: &Actor,
        reason: String,
        actor: &Actor,
        now: Timestamp,
    ) -> Result<(), DisputeError> {
        let from = self.status;
        let to = DisputeStatus::Escalated;
        check_transition(&self.id, from, to)?;
        let reason = require_text(Some(reason), "escalationReason")?;

        self.record(
            AuditDraft::new(
                AuditAction::DisputeEscalated,
                json!({
                    "escalatedTo": escalated_to.user_id.as_str(),
                    "escalatedToName": escalated_to.user_name,
                    "reason": reason,
                }),
            )
            .with_change(from.as_str(), to.as_str()),
            actor,
            now,
        )?;

        self.status = to;
        self.escalated_to = Some(escalated_to.user_id.clone());
        self.escalated_to_name = Some(escalated_to.user_name.clone());
        self.escalated_date.get_or_insert(now);
        self.escalation_reason = Some(reason);
        Ok(())
    }

    /// Append the audit entry for a mutation and bump the version.
    ///
    /// Called before any field is changed, so a canonicalization failure
    /// leaves the aggregate untouched.
    fn record(&mut self, draft: AuditDraft, actor: &Actor, now: Timestamp) -> Result<(), DisputeError> {
        let stamped = self.audit_trail.append(draft, actor, now)?.timestamp();
        self.updated_at = stamped;
        self.version += 1;
        Ok(())
    }
}
