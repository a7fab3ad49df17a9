//! # Audit Ledger
//!
//! Every mutation of a dispute appends exactly one [`AuditEntry`] to its
//! [`AuditTrail`]. The trail is append-only: it exposes no way to edit,
//! reorder, or remove an entry, and it is the only type that constructs
//! entries.
//!
//! ## Tamper Evidence
//!
//! Entries form a SHA-256 hash chain. Each entry stores the hash of its
//! predecessor (`previousHash`, 64 zeros for the first entry) and its own
//! `entryHash`, computed over the canonical JSON of its content together
//! with `previousHash`. Editing, dropping, or reordering any stored entry
//! breaks [`AuditTrail::verify`].
//!
//! ## Ordering
//!
//! Timestamps are non-decreasing along the trail. An append whose clock
//! reading is earlier than the last entry is stamped with the last entry's
//! timestamp instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dispute_core::{
    sha256_hex, Actor, AuditEntryId, CanonicalBytes, CanonicalizationError, Timestamp, UserId,
    ZERO_HASH_HEX,
};

use crate::error::AuditError;

/// The fixed vocabulary of audited actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// The dispute was filed.
    DisputeCreated,
    /// The status moved through the generic status operation.
    StatusChanged,
    /// A reviewer was assigned.
    Assigned,
    /// An evidence file was attached.
    EvidenceAdded,
    /// A comment was posted.
    CommentAdded,
    /// The dispute was resolved or rejected.
    DisputeResolved,
    /// The dispute was escalated.
    DisputeEscalated,
}

impl AuditAction {
    /// The persisted action name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisputeCreated => "dispute_created",
            Self::StatusChanged => "status_changed",
            Self::Assigned => "assigned",
            Self::EvidenceAdded => "evidence_added",
            Self::CommentAdded => "comment_added",
            Self::DisputeResolved => "dispute_resolved",
            Self::DisputeEscalated => "dispute_escalated",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// The hashed content of an audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Unique within the trail.
    pub id: AuditEntryId,
    /// What happened.
    pub action: AuditAction,
    /// Who did it.
    pub user_id: UserId,
    /// Display name of who did it.
    pub user_name: String,
    /// When it was recorded.
    pub timestamp: Timestamp,
    /// Action-specific structured payload.
    pub details: Value,
    /// Prior value for status-bearing actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<String>,
    /// New value for status-bearing actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

/// One immutable entry in a dispute's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// The entry content.
    #[serde(flatten)]
    pub record: AuditRecord,
    /// `entryHash` of the preceding entry.
    pub previous_hash: String,
    /// Hash of this entry's content and `previousHash`.
    pub entry_hash: String,
}

impl AuditEntry {
    /// The audited action.
    pub fn action(&self) -> AuditAction {
        self.record.action
    }

    /// The entry timestamp.
    pub fn timestamp(&self) -> Timestamp {
        self.record.timestamp
    }

    /// The action-specific payload.
    pub fn details(&self) -> &Value {
        &self.record.details
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashInput<'a> {
    previous_hash: &'a str,
    #[serde(flatten)]
    record: &'a AuditRecord,
}

fn entry_hash(previous_hash: &str, record: &AuditRecord) -> Result<String, CanonicalizationError> {
    let canonical = CanonicalBytes::new(&HashInput {
        previous_hash,
        record,
    })?;
    Ok(sha256_hex(&canonical))
}

/// A new entry before it is stamped and chained.
#[derive(Debug, Clone)]
pub struct AuditDraft {
    /// What happened.
    pub action: AuditAction,
    /// Action-specific structured payload.
    pub details: Value,
    /// Prior value for status-bearing actions.
    pub previous_value: Option<String>,
    /// New value for status-bearing actions.
    pub new_value: Option<String>,
}

impl AuditDraft {
    /// A draft with no before/after values.
    pub fn new(action: AuditAction, details: Value) -> Self {
        Self {
            action,
            details,
            previous_value: None,
            new_value: None,
        }
    }

    /// Attach before/after values.
    pub fn with_change(mut self, previous: impl Into<String>, new: impl Into<String>) -> Self {
        self.previous_value = Some(previous.into());
        self.new_value = Some(new.into());
        self
    }
}

/// The append-only audit trail of one dispute.
///
/// Serializes as a plain JSON array of entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail(Vec<AuditEntry>);

impl AuditTrail {
    /// An empty trail. Only valid as the starting point of filing.
    pub(crate) fn new() -> Self {
        Self(Vec::new())
    }

    /// Rebuild a chain over entry content that was stored without hashes,
    /// preserving order. Used by legacy migration.
    pub(crate) fn seal(records: Vec<AuditRecord>) -> Result<Self, CanonicalizationError> {
        let mut trail = Self::new();
        for mut record in records {
            if let Some(last) = trail.0.last() {
                if record.timestamp < last.record.timestamp {
                    record.timestamp = last.record.timestamp;
                }
            }
            trail.push_record(record)?;
        }
        Ok(trail)
    }

    /// Stamp, chain, and append an entry. Returns the appended entry.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError`] if `details` cannot be
    /// canonicalized (e.g. it contains a float).
    pub fn append(
        &mut self,
        draft: AuditDraft,
        actor: &Actor,
        now: Timestamp,
    ) -> Result<&AuditEntry, CanonicalizationError> {
        let timestamp = match self.0.last() {
            Some(last) if now < last.record.timestamp => last.record.timestamp,
            _ => now,
        };
        let record = AuditRecord {
            id: self.fresh_id(),
            action: draft.action,
            user_id: actor.user_id.clone(),
            user_name: actor.user_name.clone(),
            timestamp,
            details: draft.details,
            previous_value: draft.previous_value,
            new_value: draft.new_value,
        };
        self.push_record(record)
    }

    fn push_record(&mut self, record: AuditRecord) -> Result<&AuditEntry, CanonicalizationError> {
        let previous_hash = self
            .0
            .last()
            .map(|e| e.entry_hash.clone())
            .unwrap_or_else(|| ZERO_HASH_HEX.to_string());
        let entry_hash = entry_hash(&previous_hash, &record)?;
        self.0.push(AuditEntry {
            record,
            previous_hash,
            entry_hash,
        });
        let idx = self.0.len() - 1;
        Ok(&self.0[idx])
    }

    /// A v4 id not already used in this trail.
    fn fresh_id(&self) -> AuditEntryId {
        loop {
            let id = AuditEntryId::new();
            if !self.0.iter().any(|e| e.record.id == id) {
                return id;
            }
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the trail has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The entries in append order.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.0
    }

    /// Iterate entries in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, AuditEntry> {
        self.0.iter()
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&AuditEntry> {
        self.0.last()
    }

    /// The hash at the head of the chain.
    pub fn head_hash(&self) -> &str {
        self.0
            .last()
            .map(|e| e.entry_hash.as_str())
            .unwrap_or(ZERO_HASH_HEX)
    }

    /// Recompute the chain and check every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns the first [`AuditError`] found, scanning from the oldest
    /// entry.
    pub fn verify(&self) -> Result<(), AuditError> {
        let first = self.0.first().ok_or(AuditError::Empty)?;
        if first.record.action != AuditAction::DisputeCreated {
            return Err(AuditError::MissingCreationEntry {
                action: first.record.action.to_string(),
            });
        }

        let mut expected_previous = ZERO_HASH_HEX;
        let mut seen = std::collections::HashSet::with_capacity(self.0.len());
        for (index, entry) in self.0.iter().enumerate() {
            if entry.previous_hash != expected_previous {
                return Err(AuditError::BrokenLink { index });
            }
            if index > 0 && entry.record.timestamp < self.0[index - 1].record.timestamp {
                return Err(AuditError::TimestampRegression { index });
            }
            if !seen.insert(entry.record.id) {
                return Err(AuditError::DuplicateId { index });
            }
            let computed = entry_hash(&entry.previous_hash, &entry.record).map_err(|e| {
                AuditError::Canonicalization {
                    index,
                    reason: e.to_string(),
                }
            })?;
            if computed != entry.entry_hash {
                return Err(AuditError::HashMismatch {
                    index,
                    stored: entry.entry_hash.clone(),
                    computed,
                });
            }
            expected_previous = entry.entry_hash.as_str();
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a AuditTrail {
    type Item = &'a AuditEntry;
    type IntoIter = std::slice::Iter<'a, AuditEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn actor() -> Actor {
        Actor::new("hr-1", "Dana Reviewer").unwrap()
    }

    fn t(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn trail_of(n: usize) -> AuditTrail {
        let mut trail = AuditTrail::new();
        trail
            .append(
                AuditDraft::new(AuditAction::DisputeCreated, json!({"reason": "short"})),
                &actor(),
                t("2026-03-02T09:00:00Z"),
            )
            .unwrap();
        for i in 1..n {
            trail
                .append(
                    AuditDraft::new(AuditAction::CommentAdded, json!({"n": i})),
                    &actor(),
                    t("2026-03-02T09:00:00Z").plus_days(i as i64),
                )
                .unwrap();
        }
        trail
    }

    #[test]
    fn first_entry_links_to_zero_hash() {
        let trail = trail_of(1);
        assert_eq!(trail.entries()[0].previous_hash, ZERO_HASH_HEX);
        assert_eq!(trail.head_hash(), trail.entries()[0].entry_hash);
        trail.verify().unwrap();
    }

    #[test]
    fn entries_chain_to_predecessor() {
        let trail = trail_of(4);
        for pair in trail.entries().windows(2) {
            assert_eq!(pair[1].previous_hash, pair[0].entry_hash);
        }
        trail.verify().unwrap();
    }

    #[test]
    fn append_clamps_backwards_clock() {
        let mut trail = trail_of(1);
        let entry = trail
            .append(
                AuditDraft::new(AuditAction::CommentAdded, json!({})),
                &actor(),
                t("2026-03-01T00:00:00Z"),
            )
            .unwrap();
        assert_eq!(entry.timestamp(), t("2026-03-02T09:00:00Z"));
        trail.verify().unwrap();
    }

    #[test]
    fn edited_sub_second_timestamp_detected() {
        let mut trail = trail_of(3);
        trail.0[1].record.timestamp = t("2026-03-03T09:00:00.000000001Z");
        assert!(matches!(
            trail.verify(),
            Err(AuditError::HashMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn nanosecond_timestamps_survive_storage() {
        let mut trail = trail_of(1);
        trail
            .append(
                AuditDraft::new(AuditAction::CommentAdded, json!({})),
                &actor(),
                t("2026-03-03T09:00:00.123456789Z"),
            )
            .unwrap();
        let stored = serde_json::to_value(&trail).unwrap();
        let reloaded: AuditTrail = serde_json::from_value(stored).unwrap();
        assert_eq!(reloaded, trail);
        reloaded.verify().unwrap();
    }

    #[test]
    fn edited_details_detected() {
        let mut trail = trail_of(3);
        trail.0[1].record.details = json!({"n": 99});
        assert!(matches!(
            trail.verify(),
            Err(AuditError::HashMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn removed_entry_detected() {
        let mut trail = trail_of(3);
        trail.0.remove(1);
        assert_eq!(trail.verify(), Err(AuditError::BrokenLink { index: 1 }));
    }

    #[test]
    fn reordered_entries_detected() {
        let mut trail = trail_of(4);
        trail.0.swap(2, 3);
        assert!(trail.verify().is_err());
    }

    #[test]
    fn empty_trail_fails_verification() {
        assert_eq!(AuditTrail::new().verify(), Err(AuditError::Empty));
    }

    #[test]
    fn float_details_rejected() {
        let mut trail = trail_of(1);
        let result = trail.append(
            AuditDraft::new(AuditAction::CommentAdded, json!({"ratio": 0.5})),
            &actor(),
            t("2026-03-03T00:00:00Z"),
        );
        assert!(result.is_err());
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn serializes_flat_camel_case() {
        let trail = trail_of(1);
        let value = serde_json::to_value(&trail).unwrap();
        let entry = &value[0];
        assert_eq!(entry["action"], "dispute_created");
        assert_eq!(entry["userId"], "hr-1");
        assert_eq!(entry["userName"], "Dana Reviewer");
        assert!(entry.get("previousValue").is_none());
        assert_eq!(entry["previousHash"], ZERO_HASH_HEX);
        assert!(entry["entryHash"].is_string());
        let back: AuditTrail = serde_json::from_value(value).unwrap();
        assert_eq!(back, trail);
        back.verify().unwrap();
    }

    #[test]
    fn seal_builds_verifiable_chain() {
        let records: Vec<AuditRecord> = trail_of(3).iter().map(|e| e.record.clone()).collect();
        let sealed = AuditTrail::seal(records).unwrap();
        assert_eq!(sealed.len(), 3);
        sealed.verify().unwrap();
    }
}
