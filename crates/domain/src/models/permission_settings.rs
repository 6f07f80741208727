//! Administrator-editable permission overrides.

use serde_json::{json, Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::permission::{PermissionPatch, PermissionSet};
use super::role::Role;

/// Settings snapshot consumed by the resolver, already normalised.
///
/// Role overrides are complete matrices. User overrides are partial patches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSettings {
    pub role_overrides: HashMap<Role, PermissionSet>,
    pub user_overrides: HashMap<Uuid, PermissionPatch>,
}

impl PermissionSettings {
    /// No overrides: every user resolves to their role default.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The seeded settings document: built-in matrices as role overrides and
    /// no user overrides.
    pub fn defaults() -> Self {
        Self {
            role_overrides: Role::all()
                .iter()
                .map(|r| (*r, r.default_permissions()))
                .collect(),
            user_overrides: HashMap::new(),
        }
    }

    /// Builds a snapshot from a stored `{rolePermissions, userPermissions}`
    /// document.
    ///
    /// Entries that cannot be normalised are skipped, so the affected role
    /// falls back to its built-in matrix and the affected user gets no patch.
    pub fn from_json(value: &JsonValue) -> Self {
        let mut settings = Self::empty();

        let Some(doc) = value.as_object() else {
            if !value.is_null() {
                tracing::warn!("Permission settings document is not an object; using defaults");
            }
            return settings;
        };

        if let Some(roles) = doc.get("rolePermissions").and_then(JsonValue::as_object) {
            for (key, raw) in roles {
                let Ok(role) = key.parse::<Role>() else {
                    tracing::warn!(role = %key, "Ignoring permissions for unknown role");
                    continue;
                };
                match PermissionPatch::from_document(raw) {
                    Some(patch) => {
                        settings.role_overrides.insert(role, patch.to_replacement());
                    }
                    None => tracing::warn!(
                        role = %role,
                        "Malformed role permission override; falling back to built-in matrix"
                    ),
                }
            }
        }

        if let Some(users) = doc.get("userPermissions").and_then(JsonValue::as_object) {
            for (key, raw) in users {
                let Ok(user_id) = Uuid::parse_str(key) else {
                    tracing::warn!(user_id = %key, "Ignoring permissions keyed by invalid user id");
                    continue;
                };
                if raw.is_null() {
                    continue;
                }
                match PermissionPatch::from_document(raw) {
                    Some(patch) => {
                        settings.user_overrides.insert(user_id, patch);
                    }
                    None => tracing::warn!(
                        user_id = %user_id,
                        "Malformed user permission override; ignoring it"
                    ),
                }
            }
        }

        settings
    }

    /// Renders the snapshot in the flat-flag shape.
    pub fn to_json(&self) -> JsonValue {
        let roles: BTreeMap<String, JsonValue> = self
            .role_overrides
            .iter()
            .map(|(role, set)| (role.to_string(), JsonValue::Object(set.to_flags())))
            .collect();

        let users: Map<String, JsonValue> = self
            .user_overrides
            .iter()
            .map(|(id, patch)| (id.to_string(), json!(patch)))
            .collect();

        json!({
            "rolePermissions": roles,
            "userPermissions": users,
        })
    }
}
