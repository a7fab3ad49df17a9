//! # Dispute Commands
//!
//! A [`DisputeCommand`] is one mutating operation expressed as data. The
//! manager runs every operation through
//! [`DisputeManager::execute`](crate::DisputeManager::execute), so loading,
//! version checks, chain verification and saving live in one place.

use dispute_core::{Actor, Amount, Timestamp};

use crate::dispute::CommissionDispute;
use crate::error::DisputeError;
use crate::evidence::NewEvidence;
use crate::status::{DisputeStatus, Resolution};

/// A mutating operation on an existing dispute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisputeCommand {
    /// Move through a transition that carries no data of its own.
    ChangeStatus {
        /// Target status.
        status: DisputeStatus,
        /// Optional note recorded on the audit entry.
        notes: Option<String>,
    },

    /// Assign (or reassign) a reviewer.
    Assign {
        /// The new reviewer.
        assignee: Actor,
    },

    /// Attach an evidence file.
    AddEvidence(NewEvidence),

    /// Post a comment.
    AddComment {
        /// Full comment text.
        comment: String,
        /// Hidden from the filer.
        is_internal: bool,
    },

    /// Close the dispute with an outcome.
    Resolve {
        /// The outcome.
        resolution: Resolution,
        /// Reviewer's notes. Required.
        notes: String,
        /// Required for approvals, forbidden for rejection.
        approved_amount: Option<Amount>,
    },

    /// Escalate an under-review dispute.
    Escalate {
        /// Who the dispute goes to.
        escalated_to: Actor,
        /// Why. Required.
        reason: String,
    },
}

impl DisputeCommand {
    /// Short operation name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChangeStatus { .. } => "change_status",
            Self::Assign { .. } => "assign",
            Self::AddEvidence(_) => "add_evidence",
            Self::AddComment { .. } => "add_comment",
            Self::Resolve { .. } => "resolve",
            Self::Escalate { .. } => "escalate",
        }
    }

    /// Apply this command to `dispute` on behalf of `actor`.
    pub(crate) fn apply(
        self,
        dispute: &mut CommissionDispute,
        actor: &Actor,
        now: Timestamp,
        preview_len: usize,
    ) -> Result<(), DisputeError> {
        match self {
            Self::ChangeStatus { status, notes } => dispute.change_status(status, notes, actor, now),
            Self::Assign { assignee } => dispute.assign(&assignee, actor, now),
            Self::AddEvidence(evidence) => dispute
                .add_evidence(evidence, actor, now, preview_len)
                .map(|_| ()),
            Self::AddComment {
                comment,
                is_internal,
            } => dispute
                .add_comment(comment, is_internal, actor, now, preview_len)
                .map(|_| ()),
            Self::Resolve {
                resolution,
                notes,
                approved_amount,
            } => dispute.resolve(resolution, notes, approved_amount, actor, now),
            Self::Escalate {
                escalated_to,
                reason,
            } => dispute.escalate(&escalated_to, reason, actor, now),
        }
    }
}
