//! Permission resolution.
//!
//! Resolves the effective permission matrix for a user from the layers below,
//! highest precedence first:
//! 1. User override from the settings document (partial patch)
//! 2. Override stored on the user record (partial patch)
//! 3. Role override from the settings document (complete matrix)
//! 4. Built-in role default
//!
//! Patches are layered on the role-level result, so flags they leave
//! unspecified keep the role-level value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::models::{
    Action, Capability, PermissionPatch, PermissionSet, PermissionSettings, Resource, Role,
    UserProfile,
};

/// Layer that produced the effective matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSource {
    UserOverride,
    EntityOverride,
    RoleOverride,
    RoleDefault,
}

impl std::fmt::Display for PermissionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserOverride => write!(f, "user_override"),
            Self::EntityOverride => write!(f, "entity_override"),
            Self::RoleOverride => write!(f, "role_override"),
            Self::RoleDefault => write!(f, "role_default"),
        }
    }
}

/// Resolved permissions for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermissions {
    role: Role,
    permissions: PermissionSet,
    source: PermissionSource,
}

impl EffectivePermissions {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    pub fn source(&self) -> PermissionSource {
        self.source
    }

    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.permissions.allows(resource, action)
    }

    /// String-keyed check. Unknown resources or actions are denied.
    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        match (resource.parse::<Resource>(), action.parse::<Action>()) {
            (Ok(resource), Ok(action)) => self.allows(resource, action),
            _ => false,
        }
    }

    pub fn can_access(&self, resource: &str) -> bool {
        self.has_permission(resource, "read")
    }

    pub fn can_create(&self, resource: &str) -> bool {
        self.has_permission(resource, "create")
    }

    pub fn can_update(&self, resource: &str) -> bool {
        self.has_permission(resource, "update")
    }

    pub fn can_delete(&self, resource: &str) -> bool {
        self.has_permission(resource, "delete")
    }

    /// Export is not modelled separately; it follows read access.
    pub fn can_export(&self, resource: &str) -> bool {
        self.has_permission(resource, "read")
    }

    /// Whether the page at `path` may be shown. Unknown pages are denied.
    pub fn can_access_page(&self, path: &str) -> bool {
        let capability = match path {
            "/" => Capability::ViewDashboard,
            "/trucks" => Capability::ViewTrucks,
            "/maintenance" => Capability::ViewMaintenance,
            "/mechanics" => Capability::ViewMechanics,
            "/reports" => Capability::ViewReports,
            "/users" => Capability::ViewUsers,
            "/settings" => Capability::ViewSettings,
            "/admin" => Capability::ViewAdmin,
            _ => return false,
        };
        self.permissions.contains(capability)
    }

    /// All twenty flags in the flat shape clients consume.
    pub fn to_flags(&self) -> Map<String, JsonValue> {
        self.permissions.to_flags()
    }
}

/// Resolves effective permissions.
///
/// `user_patch` is the normalised override stored on the user record, if any.
pub fn resolve_permissions(
    role: Role,
    user_id: Uuid,
    user_patch: Option<&PermissionPatch>,
    settings: &PermissionSettings,
) -> EffectivePermissions {
    let (mut permissions, mut source) = match settings.role_overrides.get(&role) {
        Some(matrix) => (matrix.clone(), PermissionSource::RoleOverride),
        None => (role.default_permissions(), PermissionSource::RoleDefault),
    };

    if let Some(patch) = user_patch {
        permissions = permissions.patched(patch);
        source = PermissionSource::EntityOverride;
    }

    if let Some(patch) = settings.user_overrides.get(&user_id) {
        permissions = permissions.patched(patch);
        source = PermissionSource::UserOverride;
    }

    EffectivePermissions {
        role,
        permissions,
        source,
    }
}

/// Resolves effective permissions for a loaded user profile.
pub fn resolve_for_user(user: &UserProfile, settings: &PermissionSettings) -> EffectivePermissions {
    let entity_patch = user.permission_patch();
    resolve_permissions(user.role, user.id, entity_patch.as_ref(), settings)
}
