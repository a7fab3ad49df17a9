//! # Dispute Status
//!
//! The lifecycle state machine of a commission dispute.
//!
//! ## Transition Graph
//!
//! ```text
//!                  assign()
//! open ───────────────────────────▶ under-review ──resolve()──▶ resolved
//!                                     │      ▲   └──resolve()──▶ rejected
//!                           escalate()│      │assign()
//!                                     ▼      │
//!                                   escalated ──resolve()──▶ resolved | rejected
//! ```
//!
//! `resolved` and `rejected` are terminal. The table is consulted by every
//! mutating entry point on [`CommissionDispute`](crate::CommissionDispute);
//! a move that is not listed fails with
//! [`DisputeError::IllegalTransition`](crate::DisputeError::IllegalTransition).

use serde::{Deserialize, Serialize};

use crate::error::DisputeError;

/// The lifecycle state of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisputeStatus {
    /// Filed, awaiting assignment.
    Open,
    /// Assigned to a reviewer.
    UnderReview,
    /// Closed with an approved amount. Terminal state.
    Resolved,
    /// Closed without payout. Terminal state.
    Rejected,
    /// Handed to a higher authority for a decision.
    Escalated,
}

impl DisputeStatus {
    /// Every status, in lifecycle order.
    pub fn all() -> &'static [DisputeStatus] {
        &[
            Self::Open,
            Self::UnderReview,
            Self::Resolved,
            Self::Rejected,
            Self::Escalated,
        ]
    }

    /// The persisted string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::UnderReview => "under-review",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
            Self::Escalated => "escalated",
        }
    }

    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Rejected)
    }

    /// Valid target statuses from this status.
    pub fn valid_transitions(&self) -> &'static [DisputeStatus] {
        match self {
            Self::Open => &[Self::UnderReview],
            Self::UnderReview => &[Self::Resolved, Self::Rejected, Self::Escalated],
            Self::Escalated => &[Self::UnderReview, Self::Resolved, Self::Rejected],
            Self::Resolved | Self::Rejected => &[],
        }
    }

    /// Whether `to` is reachable from this status in one step.
    pub fn can_transition_to(&self, to: DisputeStatus) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for DisputeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown dispute status \"{s}\""))
    }
}

/// Check a transition against the table.
///
/// # Errors
///
/// [`DisputeError::TerminalState`] if `from` is terminal, otherwise
/// [`DisputeError::IllegalTransition`] if `to` is not a valid target.
pub(crate) fn check_transition(
    dispute_id: &dyn std::fmt::Display,
    from: DisputeStatus,
    to: DisputeStatus,
) -> Result<(), DisputeError> {
    if from.is_terminal() {
        return Err(DisputeError::TerminalState {
            dispute_id: dispute_id.to_string(),
            state: from.as_str().to_string(),
        });
    }
    if !from.can_transition_to(to) {
        let allowed: Vec<&str> = from.valid_transitions().iter().map(|s| s.as_str()).collect();
        return Err(DisputeError::IllegalTransition {
            dispute_id: dispute_id.to_string(),
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
            reason: format!("allowed targets from {from}: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

/// Outcome recorded by `resolve`.
///
/// Approval outcomes land in [`DisputeStatus::Resolved`] and require an
/// approved amount; [`Resolution::Rejected`] lands in
/// [`DisputeStatus::Rejected`] and forbids one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// The full expected commission is approved.
    ApprovedFull,
    /// Some amount is approved, possibly different from either claimed figure.
    ApprovedPartial,
    /// Nothing is approved.
    Rejected,
}

impl Resolution {
    /// Every resolution outcome.
    pub fn all() -> &'static [Resolution] {
        &[Self::ApprovedFull, Self::ApprovedPartial, Self::Rejected]
    }

    /// The persisted string name of this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApprovedFull => "approved-full",
            Self::ApprovedPartial => "approved-partial",
            Self::Rejected => "rejected",
        }
    }

    /// The status a dispute enters when resolved with this outcome.
    pub fn target_status(&self) -> DisputeStatus {
        match self {
            Self::ApprovedFull | Self::ApprovedPartial => DisputeStatus::Resolved,
            Self::Rejected => DisputeStatus::Rejected,
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown resolution \"{s}\""))
    }
}
