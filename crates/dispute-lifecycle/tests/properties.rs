//! # Lifecycle Property Tests
//!
//! Random operation sequences against a manager, checking after every step:
//! - a successful operation appends exactly one audit entry and leaves every
//!   earlier entry byte-identical
//! - a failed operation changes nothing
//! - `approvedAmount` is present iff the status is `resolved`
//! - once terminal, status operations never succeed
//! - the audit chain always verifies

use std::sync::Arc;

use dispute_core::{Actor, Amount, ConsultantId, ManualClock, Timestamp};
use dispute_lifecycle::{
    AuditEntry, DisputeCommand, DisputeManager, DisputeStatus, NewDispute, NewEvidence, Resolution,
};
use dispute_store::MemoryStore;
use proptest::prelude::*;

fn reviewer(n: u8) -> Actor {
    Actor::new(format!("agent-{n}"), format!("Agent {n}")).unwrap()
}

fn command() -> impl Strategy<Value = DisputeCommand> {
    prop_oneof![
        (
            prop::sample::select(DisputeStatus::all().to_vec()),
            prop::option::of("[a-z ]{0,10}")
        )
            .prop_map(|(status, notes)| DisputeCommand::ChangeStatus { status, notes }),
        (0u8..3).prop_map(|n| DisputeCommand::Assign {
            assignee: reviewer(n)
        }),
        ("[a-z.]{0,8}", "[a-z ]{0,80}")
            .prop_map(|(f, d)| DisputeCommand::AddEvidence(NewEvidence::new(f, d))),
        ("[a-z ]{0,80}", any::<bool>()).prop_map(|(comment, is_internal)| {
            DisputeCommand::AddComment {
                comment,
                is_internal,
            }
        }),
        (
            prop::sample::select(Resolution::all().to_vec()),
            "[a-z ]{0,10}",
            prop::option::of(0i64..20_000)
        )
            .prop_map(|(resolution, notes, amount)| DisputeCommand::Resolve {
                resolution,
                notes,
                approved_amount: amount.map(|n| Amount::new(n).unwrap()),
            }),
        ((0u8..3), "[a-z ]{0,10}").prop_map(|(n, reason)| DisputeCommand::Escalate {
            escalated_to: reviewer(n),
            reason,
        }),
    ]
}

fn is_status_operation(command: &DisputeCommand) -> bool {
    matches!(
        command,
        DisputeCommand::ChangeStatus { .. }
            | DisputeCommand::Assign { .. }
            | DisputeCommand::Resolve { .. }
            | DisputeCommand::Escalate { .. }
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn audit_trail_is_append_only(
        commands in prop::collection::vec(command(), 1..24),
        gaps in prop::collection::vec(0i64..3, 24),
    ) {
        let clock = ManualClock::new(Timestamp::parse("2026-03-02T09:00:00Z").unwrap());
        let manager = DisputeManager::new(MemoryStore::new()).with_clock(Arc::new(clock.clone()));
        let actor = reviewer(9);
        let mut current = manager
            .file_dispute(
                NewDispute::complete(
                    ConsultantId::new("c-1").unwrap(),
                    "missing commission",
                    Amount::new(5000).unwrap(),
                    Amount::new(6000).unwrap(),
                ),
                &actor,
            )
            .unwrap();
        let mut successes = 0usize;

        for (command, gap) in commands.into_iter().zip(gaps) {
            clock.advance_days(gap);
            let was_terminal = current.status.is_terminal();
            let status_op = is_status_operation(&command);
            let before: Vec<AuditEntry> = current.audit_trail.entries().to_vec();

            match manager.execute(&current.id, command, &actor, Some(current.version)) {
                Ok(next) => {
                    prop_assert!(!(was_terminal && status_op));
                    successes += 1;
                    prop_assert_eq!(next.audit_trail.len(), before.len() + 1);
                    prop_assert_eq!(&next.audit_trail.entries()[..before.len()], &before[..]);
                    prop_assert_eq!(next.version, current.version + 1);
                    current = next;
                }
                Err(_) => {
                    let stored = manager.get(&current.id).unwrap();
                    prop_assert_eq!(stored.audit_trail.entries(), &before[..]);
                    prop_assert_eq!(stored.version, current.version);
                }
            }

            prop_assert_eq!(
                current.approved_amount.is_some(),
                current.status == DisputeStatus::Resolved
            );
            prop_assert!(current.audit_trail.verify().is_ok());
        }

        prop_assert_eq!(current.audit_trail.len(), 1 + successes);
        prop_assert_eq!(current.version as usize, successes);
    }
}
