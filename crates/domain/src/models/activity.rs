//! User activity domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use shared::pagination::PageParams;
use std::str::FromStr;
use uuid::Uuid;

use super::audit_log::AuditAction;
use super::user::UserSummary;

/// Entity type used for login and logout activities.
pub const USER_SESSION_ENTITY: &str = "USER_SESSION";

/// Behavioural action recorded by an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    View,
    Export,
    Import,
}

impl ActivityAction {
    pub fn all() -> &'static [ActivityAction] {
        &[
            ActivityAction::Create,
            ActivityAction::Update,
            ActivityAction::Delete,
            ActivityAction::Login,
            ActivityAction::Logout,
            ActivityAction::View,
            ActivityAction::Export,
            ActivityAction::Import,
        ]
    }

    /// The audit action for structural changes; `None` for behavioural ones.
    pub fn audit_action(&self) -> Option<AuditAction> {
        match self {
            ActivityAction::Create => Some(AuditAction::Create),
            ActivityAction::Update => Some(AuditAction::Update),
            ActivityAction::Delete => Some(AuditAction::Delete),
            _ => None,
        }
    }
}

impl From<AuditAction> for ActivityAction {
    fn from(action: AuditAction) -> Self {
        match action {
            AuditAction::Create => ActivityAction::Create,
            AuditAction::Update => ActivityAction::Update,
            AuditAction::Delete => ActivityAction::Delete,
        }
    }
}

impl FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        ActivityAction::all()
            .iter()
            .copied()
            .find(|a| a.to_string() == upper)
            .ok_or_else(|| format!("Unknown activity action: {}", s))
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActivityAction::Create => "CREATE",
            ActivityAction::Update => "UPDATE",
            ActivityAction::Delete => "DELETE",
            ActivityAction::Login => "LOGIN",
            ActivityAction::Logout => "LOGOUT",
            ActivityAction::View => "VIEW",
            ActivityAction::Export => "EXPORT",
            ActivityAction::Import => "IMPORT",
        };
        f.write_str(s)
    }
}

/// Persisted activity entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: ActivityAction,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    pub old_values: Option<JsonValue>,
    pub new_values: Option<JsonValue>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

/// Input for writing a new activity entry.
#[derive(Debug, Clone)]
pub struct NewActivityEntry {
    pub user_id: Uuid,
    pub action: ActivityAction,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    pub old_values: Option<JsonValue>,
    pub new_values: Option<JsonValue>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing activity entries.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub user_id: Option<Uuid>,
    pub action: Option<ActivityAction>,
    pub entity_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ActivityQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams::new(self.limit, self.offset)
    }

    pub fn matches(&self, entry: &ActivityEntry) -> bool {
        self.user_id.map_or(true, |id| entry.user_id == id)
            && self.action.map_or(true, |a| entry.action == a)
            && self
                .entity_type
                .as_deref()
                .map_or(true, |t| entry.entity_type == t)
            && self.start_date.map_or(true, |start| entry.created_at >= start)
            && self.end_date.map_or(true, |end| entry.created_at <= end)
    }
}
