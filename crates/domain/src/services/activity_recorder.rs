//! Activity recording service.
//!
//! Writes activity entries and, for structural changes to an identified
//! entity, a parallel audit entry. Recording is best-effort: failures are
//! logged and counted, never returned to the caller.

use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use uuid::Uuid;

use super::diff::change_record;
use super::store::{ActivityStore, AuditLogStore, UserDirectory};
use crate::models::{
    ActivityAction, AuditAction, NewActivityEntry, NewAuditEntry, RequestMeta, UserProfile,
};

/// Counter incremented whenever a best-effort write is dropped.
pub const RECORDS_DROPPED_METRIC: &str = "activity_records_dropped_total";

/// Builder for one activity record.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    user_id: Uuid,
    action: ActivityAction,
    entity_type: String,
    entity_id: Option<String>,
    entity_name: Option<String>,
    before: Option<JsonValue>,
    after: Option<JsonValue>,
    request_meta: Option<RequestMeta>,
    metadata: Option<JsonValue>,
}

impl ActivityRecord {
    /// Create a record for `action` by `user_id` on `entity_type`.
    pub fn new(user_id: Uuid, action: ActivityAction, entity_type: impl Into<String>) -> Self {
        Self {
            user_id,
            action,
            entity_type: entity_type.into(),
            entity_id: None,
            entity_name: None,
            before: None,
            after: None,
            request_meta: None,
            metadata: None,
        }
    }

    /// Create a record for a structural change to an identified entity.
    pub fn entity_change(
        user_id: Uuid,
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self::new(user_id, action.into(), entity_type).with_entity_id(entity_id)
    }

    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    /// Snapshot of the entity before the change.
    pub fn with_before(mut self, before: JsonValue) -> Self {
        self.before = Some(before);
        self
    }

    /// Snapshot of the entity after the change.
    pub fn with_after(mut self, after: JsonValue) -> Self {
        self.after = Some(after);
        self
    }

    pub fn with_request_meta(mut self, meta: RequestMeta) -> Self {
        self.request_meta = Some(meta);
        self
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The audit action this record implies, if it is a structural change to
    /// an identified entity.
    fn audit_action(&self) -> Option<AuditAction> {
        self.entity_id.as_ref()?;
        self.action.audit_action()
    }
}

/// Records activity and audit entries.
#[derive(Clone)]
pub struct ActivityRecorder {
    activities: Arc<dyn ActivityStore>,
    audit_logs: Arc<dyn AuditLogStore>,
    users: Arc<dyn UserDirectory>,
}

impl ActivityRecorder {
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        audit_logs: Arc<dyn AuditLogStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            activities,
            audit_logs,
            users,
        }
    }

    /// Persists the record. Never fails.
    pub async fn record(&self, record: ActivityRecord) {
        let now = Utc::now();
        let mut metadata = record.metadata.clone();
        let mut entity_name = record.entity_name.clone();

        if let Some(audit_action) = record.audit_action() {
            let written = self.write_audit(&record, audit_action, now).await;
            metadata = Some(with_audit_flag(metadata, written));
            entity_name.get_or_insert_with(|| {
                format!(
                    "{} {}",
                    record.entity_type,
                    audit_action.to_string().to_lowercase()
                )
            });
        }

        let meta = record.request_meta.as_ref();
        let entry = NewActivityEntry {
            user_id: record.user_id,
            action: record.action,
            entity_type: record.entity_type.clone(),
            entity_id: record.entity_id.clone(),
            entity_name,
            old_values: record.before,
            new_values: record.after,
            ip_address: meta.map(|m| m.ip_address.clone()),
            user_agent: meta.and_then(|m| m.user_agent.clone()),
            metadata,
            created_at: now,
        };

        if let Err(e) = self.activities.insert(entry).await {
            tracing::error!(
                error = %e,
                user_id = %record.user_id,
                action = %record.action,
                entity_type = %record.entity_type,
                "Failed to write activity entry"
            );
            counter!(RECORDS_DROPPED_METRIC, "kind" => "activity").increment(1);
        }
    }

    /// Records on a spawned task so the write completes even if the caller's
    /// own future is dropped.
    pub fn record_detached(&self, record: ActivityRecord) -> tokio::task::JoinHandle<()> {
        let recorder = self.clone();
        tokio::spawn(async move { recorder.record(record).await })
    }

    async fn write_audit(
        &self,
        record: &ActivityRecord,
        action: AuditAction,
        at: DateTime<Utc>,
    ) -> bool {
        let entity_id = record.entity_id.clone().unwrap_or_default();
        let changes = change_record(action, record.before.as_ref(), record.after.as_ref());

        let mut entry = NewAuditEntry::new(action, &record.entity_type, entity_id, record.user_id)
            .with_changes(&changes)
            .with_timestamp(at);
        if let Some(actor) = self.current_profile(record.user_id).await {
            entry = entry.with_actor(&actor);
        }
        if let Some(meta) = &record.request_meta {
            entry = entry.with_request_meta(meta);
        }

        match self.audit_logs.insert(entry).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user_id = %record.user_id,
                    action = %action,
                    entity_type = %record.entity_type,
                    entity_id = ?record.entity_id,
                    "Failed to write audit entry"
                );
                counter!(RECORDS_DROPPED_METRIC, "kind" => "audit").increment(1);
                false
            }
        }
    }

    /// The actor's profile as of now. Missing or failed lookups leave the
    /// denormalised identity fields empty.
    async fn current_profile(&self, user_id: Uuid) -> Option<UserProfile> {
        match self.users.find(user_id).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                tracing::warn!(user_id = %user_id, "Audit actor not found");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user_id, "Failed to load audit actor");
                None
            }
        }
    }
}

fn with_audit_flag(metadata: Option<JsonValue>, written: bool) -> JsonValue {
    match metadata {
        Some(JsonValue::Object(mut map)) => {
            map.insert("auditLog".to_string(), JsonValue::Bool(written));
            JsonValue::Object(map)
        }
        None | Some(JsonValue::Null) => json!({ "auditLog": written }),
        Some(other) => json!({ "auditLog": written, "details": other }),
    }
}
