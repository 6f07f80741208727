//! User identity as seen by the authorization core.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::permission::PermissionPatch;
use super::role::Role;

/// The current profile of a user, loaded per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Raw per-user override stored on the user record, in either shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<JsonValue>,
}

impl UserProfile {
    /// Normalises the raw per-user override, if any.
    ///
    /// A malformed override is logged and ignored.
    pub fn permission_patch(&self) -> Option<PermissionPatch> {
        let raw = self.permissions.as_ref().filter(|v| !v.is_null())?;
        let patch = PermissionPatch::from_document(raw);
        if patch.is_none() {
            tracing::warn!(user_id = %self.id, "Malformed permission override on user record; ignoring it");
        }
        patch
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.to_string(),
        }
    }
}

/// Acting user attached to query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permission::Capability;
    use serde_json::json;

    fn profile(permissions: Option<JsonValue>) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            name: "Dana Ortiz".to_string(),
            email: "dana@example.com".to_string(),
            role: Role::User,
            permissions,
        }
    }

    #[test]
    fn test_permission_patch_absent() {
        assert!(profile(None).permission_patch().is_none());
        assert!(profile(Some(JsonValue::Null)).permission_patch().is_none());
    }

    #[test]
    fn test_permission_patch_flat() {
        let patch = profile(Some(json!({ "canAddTrucks": true })))
            .permission_patch()
            .unwrap();
        assert_eq!(patch.get(Capability::AddTrucks), Some(true));
    }

    #[test]
    fn test_permission_patch_malformed() {
        assert!(profile(Some(json!("admin"))).permission_patch().is_none());
    }

    #[test]
    fn test_summary() {
        let p = profile(None);
        let summary = p.summary();
        assert_eq!(summary.id, p.id);
        assert_eq!(summary.role, "USER");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["email"], "dana@example.com");
    }
}
