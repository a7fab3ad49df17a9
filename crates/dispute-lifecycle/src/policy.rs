//! # SLA / Policy Evaluator
//!
//! Derives `slaBreached`, escalation eligibility, and resolution-time
//! metrics from a dispute's timestamps. Nothing here is stored: the flag is
//! recomputed on every read so it always reflects the policy currently in
//! force.
//!
//! ## Policy
//!
//! - **Assignment window** (business days, Monday to Friday UTC): a dispute
//!   must be assigned within this many business days of filing.
//! - **Resolution window** (calendar days): a dispute must reach a terminal
//!   state within this many days of filing.
//! - **Escalation threshold** (calendar days): an under-review dispute this
//!   old, or already in breach, is eligible for escalation.
//!
//! Only open, under-review, and escalated disputes can breach. For terminal
//! disputes the age stops at `resolvedDate`.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use dispute_core::{ConsultantId, DisputeId, Timestamp};

use crate::dispute::CommissionDispute;
use crate::status::DisputeStatus;

/// Configurable SLA thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaPolicy {
    /// Business days allowed between filing and first assignment.
    pub assignment_window_business_days: u32,
    /// Calendar days allowed between filing and resolution.
    pub resolution_window_days: u32,
    /// Age in calendar days at which an under-review dispute may be escalated.
    pub escalation_after_days: u32,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            assignment_window_business_days: 5,
            resolution_window_days: 15,
            escalation_after_days: 10,
        }
    }
}

/// The outcome of evaluating one dispute against an [`SlaPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaAssessment {
    /// Whole calendar days from filing to the reference time.
    pub age_days: i64,
    /// First assignment missed its window.
    pub assignment_overdue: bool,
    /// Resolution missed its window.
    pub resolution_overdue: bool,
    /// Either window was missed.
    pub breached: bool,
    /// The dispute is under review and old enough, or breached, to escalate.
    pub escalation_eligible: bool,
}

/// Why a dispute appears in [`SlaPolicy::alerts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlaAlertReason {
    /// Not assigned within the assignment window.
    AssignmentOverdue,
    /// Not resolved within the resolution window.
    ResolutionOverdue,
    /// Eligible for escalation.
    EscalationEligible,
}

impl SlaAlertReason {
    /// Stable name for display and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssignmentOverdue => "assignment-overdue",
            Self::ResolutionOverdue => "resolution-overdue",
            Self::EscalationEligible => "escalation-eligible",
        }
    }
}

impl std::fmt::Display for SlaAlertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// An open dispute needing attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaAlert {
    /// The dispute.
    pub dispute_id: DisputeId,
    /// Whose commission it concerns.
    pub consultant_id: ConsultantId,
    /// Current status.
    pub status: DisputeStatus,
    /// Age in whole days.
    pub age_days: i64,
    /// Every reason that applies, most severe first.
    pub reasons: Vec<SlaAlertReason>,
}

impl SlaPolicy {
    /// Evaluate `dispute` at `now`.
    ///
    /// Terminal disputes never breach. Their age stops at `resolvedDate`.
    pub fn assess(&self, dispute: &CommissionDispute, now: Timestamp) -> SlaAssessment {
        let filed = dispute.filed_date;
        if dispute.status.is_terminal() {
            let closed = dispute.resolved_date.unwrap_or(dispute.updated_at);
            return SlaAssessment {
                age_days: closed.whole_days_since(&filed),
                assignment_overdue: false,
                resolution_overdue: false,
                breached: false,
                escalation_eligible: false,
            };
        }

        let assignment_reference = dispute.assigned_date.unwrap_or(now);
        let assignment_overdue = business_days_between(filed, assignment_reference)
            > i64::from(self.assignment_window_business_days);
        let resolution_overdue = now.days_since(&filed) > f64::from(self.resolution_window_days);
        let breached = assignment_overdue || resolution_overdue;

        let age_days = now.whole_days_since(&filed);
        let escalation_eligible = dispute.status == DisputeStatus::UnderReview
            && (age_days >= i64::from(self.escalation_after_days) || breached);

        SlaAssessment {
            age_days,
            assignment_overdue,
            resolution_overdue,
            breached,
            escalation_eligible,
        }
    }

    /// A copy of `dispute` with `sla_breached` recomputed at `now`.
    pub fn refresh(&self, dispute: &CommissionDispute, now: Timestamp) -> CommissionDispute {
        let mut refreshed = dispute.clone();
        refreshed.sla_breached = self.assess(dispute, now).breached;
        refreshed
    }

    /// Non-terminal disputes that are breached or escalation-eligible at `now`.
    pub fn alerts<'a, I>(&self, disputes: I, now: Timestamp) -> Vec<SlaAlert>
    where
        I: IntoIterator<Item = &'a CommissionDispute>,
    {
        disputes
            .into_iter()
            .filter(|d| !d.status.is_terminal())
            .filter_map(|d| {
                let assessment = self.assess(d, now);
                let mut reasons = Vec::new();
                if assessment.resolution_overdue {
                    reasons.push(SlaAlertReason::ResolutionOverdue);
                }
                if assessment.assignment_overdue {
                    reasons.push(SlaAlertReason::AssignmentOverdue);
                }
                if assessment.escalation_eligible {
                    reasons.push(SlaAlertReason::EscalationEligible);
                }
                if reasons.is_empty() {
                    return None;
                }
                Some(SlaAlert {
                    dispute_id: d.id,
                    consultant_id: d.consultant_id.clone(),
                    status: d.status,
                    age_days: assessment.age_days,
                    reasons,
                })
            })
            .collect()
    }
}

/// Count Monday to Friday dates in the half-open date range
/// `(start, end]`, both taken in UTC.
///
/// Returns 0 when `end` falls on or before the date of `start`.
pub fn business_days_between(start: Timestamp, end: Timestamp) -> i64 {
    let start = start.as_datetime().date_naive();
    let end = end.as_datetime().date_naive();
    let span = (end - start).num_days();
    if span <= 0 {
        return 0;
    }
    let full_weeks = span / 7;
    let remainder_start = start + Duration::days(full_weeks * 7);
    let remainder = (1..=span % 7)
        .map(|offset| remainder_start + Duration::days(offset))
        .filter(|date| is_weekday(*date))
        .count() as i64;
    full_weeks * 5 + remainder
}

fn is_weekday(date: NaiveDate) -> bool {
    date.weekday().number_from_monday() <= 5
}

/// Mean time from filing to resolution, in whole days rounded to nearest.
///
/// Only disputes with a `resolved_date` count. Returns 0 when there are
/// none.
pub fn average_resolution_time<'a, I>(disputes: I) -> i64
where
    I: IntoIterator<Item = &'a CommissionDispute>,
{
    let (sum, count) = disputes
        .into_iter()
        .filter_map(|d| d.resolved_date.map(|r| r.days_since(&d.filed_date)))
        .fold((0.0_f64, 0_u32), |(sum, n), days| (sum + days, n + 1));
    if count == 0 {
        return 0;
    }
    (sum / f64::from(count)).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispute::NewDispute;
    use crate::status::Resolution;
    use dispute_core::{Actor, Amount};

    fn t(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn actor() -> Actor {
        Actor::new("agent-7", "Agent Seven").unwrap()
    }

    // 2026-03-02 is a Monday.
    fn filed_at(at: &str) -> CommissionDispute {
        CommissionDispute::file(
            NewDispute::complete(
                ConsultantId::new("c-1").unwrap(),
                "missing split",
                Amount::new(100).unwrap(),
                Amount::new(200).unwrap(),
            ),
            &actor(),
            t(at),
        )
        .unwrap()
    }

    fn resolve_at(d: &mut CommissionDispute, at: &str) {
        d.assign(&actor(), &actor(), d.filed_date).unwrap();
        d.resolve(
            Resolution::ApprovedFull,
            "paid".to_string(),
            Some(Amount::new(200).unwrap()),
            &actor(),
            t(at),
        )
        .unwrap();
    }

    #[test]
    fn business_days_skip_weekends() {
        // Monday to next Monday.
        assert_eq!(
            business_days_between(t("2026-03-02T09:00:00Z"), t("2026-03-09T09:00:00Z")),
            5
        );
        // Friday to Monday.
        assert_eq!(
            business_days_between(t("2026-03-06T17:00:00Z"), t("2026-03-09T08:00:00Z")),
            1
        );
        // Saturday to Sunday.
        assert_eq!(
            business_days_between(t("2026-03-07T09:00:00Z"), t("2026-03-08T09:00:00Z")),
            0
        );
        // Same day.
        assert_eq!(
            business_days_between(t("2026-03-02T09:00:00Z"), t("2026-03-02T18:00:00Z")),
            0
        );
        // Three weeks and two days, Monday to Wednesday.
        assert_eq!(
            business_days_between(t("2026-03-02T09:00:00Z"), t("2026-03-25T09:00:00Z")),
            17
        );
    }

    #[test]
    fn business_days_zero_when_reversed() {
        assert_eq!(
            business_days_between(t("2026-03-09T09:00:00Z"), t("2026-03-02T09:00:00Z")),
            0
        );
    }

    #[test]
    fn fresh_dispute_is_within_sla() {
        let d = filed_at("2026-03-02T09:00:00Z");
        let a = SlaPolicy::default().assess(&d, t("2026-03-04T09:00:00Z"));
        assert!(!a.breached);
        assert_eq!(a.age_days, 2);
        assert!(!a.escalation_eligible);
    }

    #[test]
    fn unassigned_after_window_breaches() {
        let d = filed_at("2026-03-02T09:00:00Z");
        // Six business days later.
        let a = SlaPolicy::default().assess(&d, t("2026-03-10T09:00:00Z"));
        assert!(a.assignment_overdue);
        assert!(!a.resolution_overdue);
        assert!(a.breached);
        // Open disputes are never escalation-eligible.
        assert!(!a.escalation_eligible);
    }

    #[test]
    fn late_assignment_stays_breached() {
        let mut d = filed_at("2026-03-02T09:00:00Z");
        d.assign(&actor(), &actor(), t("2026-03-11T09:00:00Z"))
            .unwrap();
        let a = SlaPolicy::default().assess(&d, t("2026-03-12T09:00:00Z"));
        assert!(a.assignment_overdue);
        assert!(a.escalation_eligible);
    }

    #[test]
    fn resolution_window_in_calendar_days() {
        let mut d = filed_at("2026-03-02T09:00:00Z");
        d.assign(&actor(), &actor(), t("2026-03-03T09:00:00Z"))
            .unwrap();
        let policy = SlaPolicy::default();
        assert!(!policy.assess(&d, t("2026-03-17T09:00:00Z")).resolution_overdue);
        assert!(policy.assess(&d, t("2026-03-17T09:00:01Z")).resolution_overdue);
    }

    #[test]
    fn escalation_eligible_by_age() {
        let mut d = filed_at("2026-03-02T09:00:00Z");
        d.assign(&actor(), &actor(), t("2026-03-03T09:00:00Z"))
            .unwrap();
        let policy = SlaPolicy::default();
        assert!(!policy.assess(&d, t("2026-03-11T09:00:00Z")).escalation_eligible);
        let a = policy.assess(&d, t("2026-03-12T09:00:00Z"));
        assert!(a.escalation_eligible);
        assert!(!a.breached);
    }

    #[test]
    fn clock_stops_at_resolution() {
        let mut d = filed_at("2026-03-02T09:00:00Z");
        resolve_at(&mut d, "2026-03-06T09:00:00Z");
        let a = SlaPolicy::default().assess(&d, t("2027-01-01T00:00:00Z"));
        assert_eq!(a.age_days, 4);
        assert!(!a.breached);
    }

    #[test]
    fn late_resolution_is_not_a_breach() {
        let mut d = filed_at("2026-03-02T09:00:00Z");
        d.assign(&actor(), &actor(), t("2026-03-03T09:00:00Z"))
            .unwrap();
        d.resolve(
            Resolution::ApprovedPartial,
            "settled late".to_string(),
            Some(Amount::new(150).unwrap()),
            &actor(),
            t("2026-03-22T09:00:00Z"),
        )
        .unwrap();
        let a = SlaPolicy::default().assess(&d, t("2026-03-23T09:00:00Z"));
        assert_eq!(a.age_days, 20);
        assert!(!a.resolution_overdue);
        assert!(!a.breached);
        assert!(!SlaPolicy::default().refresh(&d, t("2026-03-23T09:00:00Z")).sla_breached);
    }

    #[test]
    fn refresh_sets_flag_on_copy() {
        let d = filed_at("2026-03-02T09:00:00Z");
        let refreshed = SlaPolicy::default().refresh(&d, t("2026-04-01T00:00:00Z"));
        assert!(refreshed.sla_breached);
        assert!(!d.sla_breached);
        assert_eq!(refreshed.version, d.version);
    }

    #[test]
    fn alerts_list_reasons_and_skip_terminal() {
        let stale = filed_at("2026-03-02T09:00:00Z");
        let mut done = filed_at("2026-03-02T09:00:00Z");
        resolve_at(&mut done, "2026-03-30T09:00:00Z");
        let fresh = filed_at("2026-03-30T09:00:00Z");

        let alerts = SlaPolicy::default().alerts([&stale, &done, &fresh], t("2026-03-31T09:00:00Z"));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].dispute_id, stale.id);
        assert_eq!(
            alerts[0].reasons,
            vec![
                SlaAlertReason::ResolutionOverdue,
                SlaAlertReason::AssignmentOverdue
            ]
        );
    }

    #[test]
    fn average_resolution_excludes_unresolved() {
        let mut resolved = filed_at("2026-03-02T09:00:00Z");
        resolve_at(&mut resolved, "2026-03-12T09:00:00Z");
        let open = filed_at("2026-03-02T09:00:00Z");
        assert_eq!(average_resolution_time([&resolved, &open]), 10);
    }

    #[test]
    fn average_resolution_rounds_to_nearest() {
        let mut a = filed_at("2026-03-02T00:00:00Z");
        resolve_at(&mut a, "2026-03-05T00:00:00Z");
        let mut b = filed_at("2026-03-02T00:00:00Z");
        resolve_at(&mut b, "2026-03-06T12:00:00Z");
        // (3 + 4.5) / 2 = 3.75
        assert_eq!(average_resolution_time([&a, &b]), 4);
    }

    #[test]
    fn average_resolution_zero_when_none() {
        let open = filed_at("2026-03-02T09:00:00Z");
        assert_eq!(average_resolution_time([&open]), 0);
        assert_eq!(
            average_resolution_time(std::iter::empty::<&CommissionDispute>()),
            0
        );
    }

    #[test]
    fn policy_defaults_fill_missing_fields() {
        let policy: SlaPolicy = serde_json::from_str(r#"{"resolution_window_days": 3}"#).unwrap();
        assert_eq!(policy.resolution_window_days, 3);
        assert_eq!(policy.assignment_window_business_days, 5);
        assert_eq!(policy.escalation_after_days, 10);
    }
}
