//! Settings entity.

use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};
use sqlx::FromRow;

/// Permission columns of the single settings row.
#[derive(Debug, Clone, FromRow)]
pub struct SettingsEntity {
    pub role_permissions: JsonValue,
    pub user_permissions: JsonValue,
    pub updated_at: DateTime<Utc>,
}

impl SettingsEntity {
    /// The `{rolePermissions, userPermissions}` document.
    pub fn into_document(self) -> JsonValue {
        json!({
            "rolePermissions": self.role_permissions,
            "userPermissions": self.user_permissions,
        })
    }
}
