//! Field-level diff of entity snapshots.

use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeSet;

use crate::models::{AuditAction, ChangeRecord, FieldChange, FieldChanges};

/// Compares two snapshots key by key.
///
/// Values are compared by their serialized form. A key missing on one side
/// differs from an explicit `null`. Returns `None` when nothing differs.
pub fn diff(before: Option<&JsonValue>, after: Option<&JsonValue>) -> Option<FieldChanges> {
    let empty = Map::new();
    let before = before.and_then(JsonValue::as_object).unwrap_or(&empty);
    let after = after.and_then(JsonValue::as_object).unwrap_or(&empty);

    let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();

    let changes: FieldChanges = keys
        .into_iter()
        .filter_map(|key| {
            let from = before.get(key);
            let to = after.get(key);
            if serialized(from) == serialized(to) {
                return None;
            }
            Some((key.clone(), FieldChange::new(from.cloned(), to.cloned())))
        })
        .collect();

    if changes.is_empty() {
        None
    } else {
        Some(changes)
    }
}

fn serialized(value: Option<&JsonValue>) -> Option<String> {
    value.map(JsonValue::to_string)
}

/// Builds the change record stored with an audit entry.
///
/// Creates keep the full after snapshot and deletes the full before snapshot.
/// Updates keep only the differing fields.
pub fn change_record(
    action: AuditAction,
    before: Option<&JsonValue>,
    after: Option<&JsonValue>,
) -> ChangeRecord {
    match action {
        AuditAction::Create => ChangeRecord::Created(after.cloned().unwrap_or(JsonValue::Null)),
        AuditAction::Delete => ChangeRecord::Deleted(before.cloned().unwrap_or(JsonValue::Null)),
        AuditAction::Update => match diff(before, after) {
            Some(changes) => ChangeRecord::Updated(changes),
            None => ChangeRecord::Unchanged,
        },
    }
}
