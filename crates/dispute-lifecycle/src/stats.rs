//! # Stats Aggregator
//!
//! Read-only reduction of a dispute collection into the figures shown on
//! dashboard cards. [`DisputeStats::collect`] is pure: it borrows the
//! disputes and never touches the store.

use serde::Serialize;

use dispute_core::{Amount, ConsultantId};

use crate::dispute::CommissionDispute;
use crate::policy::average_resolution_time;
use crate::status::DisputeStatus;

/// Count of disputes in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    /// Awaiting assignment.
    pub open: usize,
    /// Assigned to a reviewer.
    pub under_review: usize,
    /// Closed with a payout.
    pub resolved: usize,
    /// Closed without a payout.
    pub rejected: usize,
    /// With a higher authority.
    pub escalated: usize,
}

impl StatusCounts {
    /// The count for one status.
    pub fn get(&self, status: DisputeStatus) -> usize {
        match status {
            DisputeStatus::Open => self.open,
            DisputeStatus::UnderReview => self.under_review,
            DisputeStatus::Resolved => self.resolved,
            DisputeStatus::Rejected => self.rejected,
            DisputeStatus::Escalated => self.escalated,
        }
    }

    fn bump(&mut self, status: DisputeStatus) {
        let slot = match status {
            DisputeStatus::Open => &mut self.open,
            DisputeStatus::UnderReview => &mut self.under_review,
            DisputeStatus::Resolved => &mut self.resolved,
            DisputeStatus::Rejected => &mut self.rejected,
            DisputeStatus::Escalated => &mut self.escalated,
        };
        *slot += 1;
    }
}

/// Dashboard summary of a dispute collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeStats {
    /// Number of disputes considered.
    pub total: usize,
    /// Per-status counts.
    pub by_status: StatusCounts,
    /// Sum of `disputedAmount` across every dispute.
    pub total_disputed: Amount,
    /// Sum of `approvedAmount` across resolved disputes.
    pub total_approved: Amount,
    /// Disputes whose `slaBreached` flag is set.
    pub sla_breached: usize,
    /// See [`average_resolution_time`].
    pub average_resolution_days: i64,
}

impl DisputeStats {
    /// Reduce `disputes`, keeping only those for `consultant` when given.
    ///
    /// `sla_breached` counts the stored flag; callers wanting current
    /// figures refresh the disputes through the SLA policy first.
    /// Amount sums saturate at `i64::MAX` minor units.
    pub fn collect(disputes: &[CommissionDispute], consultant: Option<&ConsultantId>) -> Self {
        let selected: Vec<&CommissionDispute> = disputes
            .iter()
            .filter(|d| consultant.map_or(true, |c| &d.consultant_id == c))
            .collect();

        let mut by_status = StatusCounts::default();
        let mut total_disputed = Amount::ZERO;
        let mut total_approved = Amount::ZERO;
        let mut sla_breached = 0;
        for d in &selected {
            by_status.bump(d.status);
            total_disputed = total_disputed.saturating_add(d.disputed_amount);
            if d.status == DisputeStatus::Resolved {
                if let Some(approved) = d.approved_amount {
                    total_approved = total_approved.saturating_add(approved);
                }
            }
            if d.sla_breached {
                sla_breached += 1;
            }
        }

        Self {
            total: selected.len(),
            by_status,
            total_disputed,
            total_approved,
            sla_breached,
            average_resolution_days: average_resolution_time(selected.iter().copied()),
        }
    }
}
