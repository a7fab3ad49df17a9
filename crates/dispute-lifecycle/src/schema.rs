//! # Persisted Collection Schema
//!
//! The blob stored under the collection key is a versioned envelope:
//!
//! ```json
//! { "schemaVersion": 1, "records": [ { "id": "...", ... } ] }
//! ```
//!
//! ## Legacy Format (version 0)
//!
//! Collections written before the envelope existed are a bare JSON array of
//! disputes whose audit entries carry no hashes and which have no `version`
//! field. They are migrated on read:
//!
//! - `version` defaults to 0.
//! - Ids that are not UUIDs (on the dispute, its audit entries, evidence, and
//!   comments) are replaced by a UUID v5 of the old string, so the same
//!   legacy id always maps to the same new one. Ids quoted inside audit
//!   `details` are history and stay as written.
//! - Audit entries are sealed into a hash chain in their stored order, with
//!   regressing timestamps clamped to their predecessor.
//! - Amounts must be non-negative integers; anything else is refused.
//! - The approved amount must be present exactly when the status is
//!   `resolved`.
//!
//! The next save writes the current version.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::audit::{AuditRecord, AuditTrail};
use crate::dispute::CommissionDispute;
use crate::error::SchemaError;
use crate::status::DisputeStatus;

/// The schema version this build writes.
pub const SCHEMA_VERSION: u64 = 1;

const AMOUNT_FIELDS: [&str; 3] = ["disputedAmount", "expectedAmount", "approvedAmount"];

const OWNED_COLLECTIONS: [&str; 3] = ["auditTrail", "evidence", "comments"];

/// Namespace for UUIDs derived from non-UUID legacy ids.
const LEGACY_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_3c2e_9a47_5d08_b3e1_47c2_d9a0_5e11);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a> {
    schema_version: u64,
    records: &'a [CommissionDispute],
}

/// A decoded collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// The schema version the document was stored in.
    pub source_version: u64,
    /// The records, migrated to the current schema.
    pub records: Vec<CommissionDispute>,
}

impl Decoded {
    /// Whether the document needs rewriting in the current schema.
    pub fn was_migrated(&self) -> bool {
        self.source_version < SCHEMA_VERSION
    }
}

/// Wrap `records` in the current envelope.
pub fn encode(records: &[CommissionDispute]) -> Result<Value, serde_json::Error> {
    serde_json::to_value(EnvelopeRef {
        schema_version: SCHEMA_VERSION,
        records,
    })
}

/// Read a stored collection document in any supported schema.
///
/// # Errors
///
/// - [`SchemaError::UnsupportedVersion`] for an envelope newer than
///   [`SCHEMA_VERSION`].
/// - [`SchemaError::Malformed`] if the document is neither an envelope nor
///   an array.
/// - [`SchemaError::InvalidRecord`] or [`SchemaError::Unmigratable`] naming
///   the first record that cannot be read.
pub fn decode(document: Value) -> Result<Decoded, SchemaError> {
    match document {
        Value::Array(items) => Ok(Decoded {
            source_version: 0,
            records: migrate_legacy(items)?,
        }),
        Value::Object(mut envelope) => {
            let found = envelope
                .get("schemaVersion")
                .and_then(Value::as_u64)
                .ok_or_else(|| {
                    SchemaError::Malformed("envelope has no integer schemaVersion".to_string())
                })?;
            if found > SCHEMA_VERSION {
                return Err(SchemaError::UnsupportedVersion {
                    found,
                    supported: SCHEMA_VERSION,
                });
            }
            let items = match envelope.remove("records") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(SchemaError::Malformed(
                        "envelope has no records array".to_string(),
                    ))
                }
            };
            let records = if found == 0 {
                migrate_legacy(items)?
            } else {
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        serde_json::from_value(item)
                            .map_err(|source| SchemaError::InvalidRecord { index, source })
                    })
                    .collect::<Result<_, _>>()?
            };
            Ok(Decoded {
                source_version: found,
                records,
            })
        }
        other => Err(SchemaError::Malformed(format!(
            "expected an object or array, found {}",
            json_kind(&other)
        ))),
    }
}

fn migrate_legacy(items: Vec<Value>) -> Result<Vec<CommissionDispute>, SchemaError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| migrate_record(index, item))
        .collect()
}

fn migrate_record(index: usize, item: Value) -> Result<CommissionDispute, SchemaError> {
    let unmigratable = |reason: String| SchemaError::Unmigratable { index, reason };

    let mut fields: Map<String, Value> = match item {
        Value::Object(fields) => fields,
        other => return Err(unmigratable(format!("record is {}", json_kind(&other)))),
    };

    for field in AMOUNT_FIELDS {
        match fields.get(field) {
            None | Some(Value::Null) => {}
            Some(value) if value.as_i64().is_some_and(|n| n >= 0) => {}
            Some(value) => {
                return Err(unmigratable(format!(
                    "{field} {value} is not a non-negative integer amount"
                )))
            }
        }
    }

    remap_legacy_id(&mut fields);
    for collection in OWNED_COLLECTIONS {
        if let Some(Value::Array(items)) = fields.get_mut(collection) {
            for item in items.iter_mut() {
                if let Value::Object(owned) = item {
                    remap_legacy_id(owned);
                }
            }
        }
    }

    let stored_trail = fields
        .insert("auditTrail".to_string(), Value::Array(Vec::new()))
        .unwrap_or(Value::Array(Vec::new()));
    let entries: Vec<AuditRecord> = serde_json::from_value(stored_trail)
        .map_err(|source| SchemaError::InvalidRecord { index, source })?;
    let trail = AuditTrail::seal(entries).map_err(|e| unmigratable(e.to_string()))?;
    trail.verify().map_err(|e| unmigratable(e.to_string()))?;

    let mut dispute: CommissionDispute = serde_json::from_value(Value::Object(fields))
        .map_err(|source| SchemaError::InvalidRecord { index, source })?;
    dispute.audit_trail = trail;

    if dispute.approved_amount.is_some() != (dispute.status == DisputeStatus::Resolved) {
        return Err(unmigratable(format!(
            "approvedAmount is {} on a {} dispute",
            if dispute.approved_amount.is_some() {
                "present"
            } else {
                "absent"
            },
            dispute.status
        )));
    }
    Ok(dispute)
}

/// The UUID a legacy id maps to: itself when it already is one.
fn legacy_uuid(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or_else(|_| Uuid::new_v5(&LEGACY_ID_NAMESPACE, raw.as_bytes()))
}

fn remap_legacy_id(fields: &mut Map<String, Value>) {
    if let Some(Value::String(raw)) = fields.get_mut("id") {
        *raw = legacy_uuid(raw).to_string();
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispute::NewDispute;
    use dispute_core::{Actor, Amount, ConsultantId, Timestamp};
    use serde_json::json;

    fn filed() -> CommissionDispute {
        CommissionDispute::file(
            NewDispute::complete(
                ConsultantId::new("c-1").unwrap(),
                "short",
                Amount::new(5000).unwrap(),
                Amount::new(6000).unwrap(),
            ),
            &Actor::new("u-1", "Uma").unwrap(),
            Timestamp::parse("2026-03-02T09:00:00Z").unwrap(),
        )
        .unwrap()
    }

    fn legacy_record() -> Value {
        json!({
            "id": "6f9619ff-8b86-4d11-b42d-00c04fc964ff",
            "consultantId": "c-1",
            "filedBy": "u-1",
            "filedByName": "Uma",
            "filedDate": "2025-11-03T10:00:00.000Z",
            "reason": "Bonus tier not applied",
            "disputedAmount": 5000,
            "expectedAmount": 6000,
            "status": "under-review",
            "assignedTo": "agent-7",
            "assignedToName": "Agent Seven",
            "assignedDate": "2025-11-04T10:00:00.000Z",
            "evidence": [],
            "comments": [],
            "auditTrail": [
                {
                    "id": "0d7c1e5e-1111-4a2b-9c3d-000000000001",
                    "action": "dispute_created",
                    "userId": "u-1",
                    "userName": "Uma",
                    "timestamp": "2025-11-03T10:00:00.000Z",
                    "details": {"reason": "Bonus tier not applied", "disputedAmount": 5000}
                },
                {
                    "id": "0d7c1e5e-1111-4a2b-9c3d-000000000002",
                    "action": "assigned",
                    "userId": "agent-7",
                    "userName": "Agent Seven",
                    "timestamp": "2025-11-04T10:00:00.000Z",
                    "details": {"assignedTo": "agent-7"}
                }
            ],
            "slaBreached": false,
            "createdAt": "2025-11-03T10:00:00.000Z",
            "updatedAt": "2025-11-04T10:00:00.000Z"
        })
    }

    #[test]
    fn envelope_carries_schema_version() {
        let value = encode(&[filed()]).unwrap();
        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["records"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn current_envelope_decodes_unchanged() {
        let records = vec![filed(), filed()];
        let decoded = decode(encode(&records).unwrap()).unwrap();
        assert_eq!(decoded.source_version, SCHEMA_VERSION);
        assert!(!decoded.was_migrated());
        assert_eq!(decoded.records, records);
    }

    #[test]
    fn newer_version_refused() {
        let err = decode(json!({"schemaVersion": 2, "records": []})).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedVersion {
                found: 2,
                supported: 1
            }
        ));
    }

    #[test]
    fn scalar_document_is_malformed() {
        assert!(matches!(decode(json!(42)), Err(SchemaError::Malformed(_))));
        assert!(matches!(
            decode(json!({"records": []})),
            Err(SchemaError::Malformed(_))
        ));
    }

    #[test]
    fn legacy_array_is_migrated_and_sealed() {
        let decoded = decode(json!([legacy_record()])).unwrap();
        assert_eq!(decoded.source_version, 0);
        assert!(decoded.was_migrated());
        let d = &decoded.records[0];
        assert_eq!(d.version, 0);
        assert_eq!(d.status, DisputeStatus::UnderReview);
        assert_eq!(d.audit_trail.len(), 2);
        d.audit_trail.verify().unwrap();
    }

    #[test]
    fn legacy_non_uuid_ids_map_deterministically() {
        let mut record = legacy_record();
        record["id"] = json!("CD-1042");
        record["auditTrail"][0]["id"] = json!("audit-1");
        record["auditTrail"][1]["id"] = json!("audit-2");
        record["evidence"] = json!([{
            "id": "ev-1",
            "fileName": "payslip.pdf",
            "description": "March payslip",
            "uploadedBy": "u-1",
            "uploadedAt": "2025-11-03T11:00:00.000Z"
        }]);
        record["comments"] = json!([{
            "id": 17,
            "userId": "u-1",
            "userName": "Uma",
            "comment": "see payslip",
            "isInternal": false,
            "createdAt": "2025-11-03T11:05:00.000Z"
        }]);
        // Numeric ids are not strings and still fail.
        assert!(matches!(
            decode(json!([record.clone()])),
            Err(SchemaError::InvalidRecord { index: 0, .. })
        ));

        record["comments"][0]["id"] = json!("c-1");
        let first = decode(json!([record.clone()])).unwrap().records.remove(0);
        let again = decode(json!([record])).unwrap().records.remove(0);
        assert_eq!(first.id, again.id);
        assert_eq!(
            first.id.as_uuid(),
            &Uuid::new_v5(&LEGACY_ID_NAMESPACE, b"CD-1042")
        );
        assert_eq!(first.evidence[0].id, again.evidence[0].id);
        assert_eq!(first.comments[0].id, again.comments[0].id);
        assert_ne!(
            first.audit_trail.entries()[0].record.id,
            first.audit_trail.entries()[1].record.id
        );
        first.audit_trail.verify().unwrap();
    }

    #[test]
    fn legacy_uuid_ids_kept() {
        let d = decode(json!([legacy_record()])).unwrap().records.remove(0);
        assert_eq!(d.id.as_uuid().to_string(), "6f9619ff-8b86-4d11-b42d-00c04fc964ff");
    }

    #[test]
    fn legacy_fractional_amount_refused() {
        let mut record = legacy_record();
        record["disputedAmount"] = json!(50.25);
        let err = decode(json!([record])).unwrap_err();
        assert!(matches!(err, SchemaError::Unmigratable { index: 0, .. }));
    }

    #[test]
    fn legacy_float_in_audit_details_refused() {
        let mut record = legacy_record();
        record["auditTrail"][1]["details"] = json!({"ratio": 0.5});
        assert!(matches!(
            decode(json!([record])),
            Err(SchemaError::Unmigratable { index: 0, .. })
        ));
    }

    #[test]
    fn legacy_unknown_action_is_invalid() {
        let mut record = legacy_record();
        record["auditTrail"][1]["action"] = json!("deleted");
        assert!(matches!(
            decode(json!([legacy_record(), record])),
            Err(SchemaError::InvalidRecord { index: 1, .. })
        ));
    }

    #[test]
    fn legacy_resolved_without_amount_refused() {
        let mut record = legacy_record();
        record["status"] = json!("resolved");
        record["resolvedDate"] = json!("2025-11-10T10:00:00.000Z");
        assert!(matches!(
            decode(json!([record])),
            Err(SchemaError::Unmigratable { .. })
        ));
    }

    #[test]
    fn legacy_trail_without_creation_entry_refused() {
        let mut record = legacy_record();
        record["auditTrail"].as_array_mut().unwrap().remove(0);
        assert!(matches!(
            decode(json!([record])),
            Err(SchemaError::Unmigratable { .. })
        ));
    }
}
