//! Audit log domain models.
//!
//! Audit entries record structural changes (create, update, delete) to
//! domain entities. They are written once and never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use shared::pagination::PageParams;
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

use super::request_meta::RequestMeta;
use super::user::{UserProfile, UserSummary};

/// Structural change recorded by an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "DELETE" => Ok(AuditAction::Delete),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Create => write!(f, "CREATE"),
            AuditAction::Update => write!(f, "UPDATE"),
            AuditAction::Delete => write!(f, "DELETE"),
        }
    }
}

/// Before and after value of one field. A `None` side means the key was
/// absent from that snapshot, which is distinct from an explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub from: Option<JsonValue>,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub to: Option<JsonValue>,
}

/// Only called when the key is present, so `null` reads as `Some(Null)`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

impl FieldChange {
    pub fn new(from: Option<JsonValue>, to: Option<JsonValue>) -> Self {
        Self { from, to }
    }
}

/// Field name to change, ordered by field name.
pub type FieldChanges = BTreeMap<String, FieldChange>;

/// What an audit entry stores about the change.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeRecord {
    /// Full snapshot of a newly created entity.
    Created(JsonValue),
    /// Full snapshot of the entity as it was before deletion.
    Deleted(JsonValue),
    /// Field-level diff of an update.
    Updated(FieldChanges),
    /// An update that changed nothing.
    Unchanged,
}

impl ChangeRecord {
    /// Stored JSON form. An unchanged update is stored as `null`.
    pub fn to_json(&self) -> Option<JsonValue> {
        match self {
            ChangeRecord::Created(after) => Some(json!({ "created": after })),
            ChangeRecord::Deleted(before) => Some(json!({ "deleted": before })),
            ChangeRecord::Updated(changes) => serde_json::to_value(changes).ok(),
            ChangeRecord::Unchanged => None,
        }
    }
}

/// Human-readable description of a stored change record.
///
/// The action decides the shape: only an UPDATE lists field names, so an
/// updated field that happens to be called `created` or `deleted` is still
/// reported as a change.
pub fn describe_changes(action: AuditAction, changes: Option<&JsonValue>) -> String {
    match action {
        AuditAction::Create => "created".to_string(),
        AuditAction::Delete => "deleted".to_string(),
        AuditAction::Update => match changes {
            Some(JsonValue::Object(map)) if !map.is_empty() => {
                let fields: Vec<&str> = map.keys().map(String::as_str).collect();
                format!("changed: {}", fields.join(", "))
            }
            None | Some(JsonValue::Null) | Some(JsonValue::Object(_)) => "no changes".to_string(),
            Some(_) => "changed".to_string(),
        },
    }
}

/// Persisted audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_role: Option<String>,
    pub changes: Option<JsonValue>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Current profile of the acting user, attached on reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl AuditEntry {
    pub fn change_summary(&self) -> String {
        describe_changes(self.action, self.changes.as_ref())
    }
}

/// Input for writing a new audit entry.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_role: Option<String>,
    pub changes: Option<JsonValue>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    /// Create a new audit entry input, timestamped now.
    pub fn new(
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        user_id: Uuid,
    ) -> Self {
        Self {
            action,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            user_id,
            user_name: None,
            user_email: None,
            user_role: None,
            changes: None,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    /// Denormalise the actor's current identity into the entry.
    pub fn with_actor(mut self, actor: &UserProfile) -> Self {
        self.user_name = Some(actor.name.clone());
        self.user_email = Some(actor.email.clone());
        self.user_role = Some(actor.role.to_string());
        self
    }

    pub fn with_changes(mut self, changes: &ChangeRecord) -> Self {
        self.changes = changes.to_json();
        self
    }

    pub fn with_request_meta(mut self, meta: &RequestMeta) -> Self {
        self.ip_address = Some(meta.ip_address.clone());
        self.user_agent = meta.user_agent.clone();
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }
}

/// Query parameters for listing audit entries.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub user_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditLogQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams::new(self.limit, self.offset)
    }

    /// Whether an entry satisfies every filter of this query.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.user_id.map_or(true, |id| entry.user_id == id)
            && self.action.map_or(true, |a| entry.action == a)
            && self
                .entity_type
                .as_deref()
                .map_or(true, |t| entry.entity_type == t)
            && self
                .entity_id
                .as_deref()
                .map_or(true, |id| entry.entity_id == id)
            && self.start_date.map_or(true, |start| entry.created_at >= start)
            && self.end_date.map_or(true, |end| entry.created_at <= end)
    }
}
