//! Permission settings routes.

use axum::{extract::State, Json};
use domain::models::{Action, AuditAction, PermissionPatch, PermissionSettings, Resource, Role};
use domain::services::ActivityRecord;
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientMeta, CurrentUser};

const SETTINGS_ENTITY: &str = "settings";
const PERMISSIONS_ENTITY_ID: &str = "permissions";

/// Returns the stored permission settings, seeding the built-in matrices on
/// first read.
pub async fn get_permissions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<JsonValue>, ApiError> {
    user.require(Resource::Settings, Action::Read)?;

    match state.stores.settings.load().await? {
        Some(document) => Ok(Json(PermissionSettings::from_json(&document).to_json())),
        None => {
            let seeded = PermissionSettings::defaults().to_json();
            state.stores.settings.save(&seeded).await?;
            tracing::info!("Seeded default permission settings");
            Ok(Json(seeded))
        }
    }
}

/// Merges the submitted overrides into the stored settings.
///
/// Each role or user key present in the body replaces that key's override.
/// A `null` user entry removes the user's override.
pub async fn update_permissions(
    State(state): State<AppState>,
    user: CurrentUser,
    ClientMeta(meta): ClientMeta,
    Json(body): Json<JsonValue>,
) -> Result<Json<JsonValue>, ApiError> {
    user.require(Resource::Settings, Action::Update)?;

    let update = SettingsUpdate::parse(&body)?;

    let current = match state.stores.settings.load().await? {
        Some(document) => PermissionSettings::from_json(&document),
        None => PermissionSettings::defaults(),
    };
    let before = current.to_json();

    let mut next = current;
    update.apply(&mut next);
    let after = next.to_json();

    state.stores.settings.save(&after).await?;

    tracing::info!(
        user_id = %user.profile.id,
        roles = update.roles.len(),
        users = update.users.len(),
        "Permission settings updated"
    );

    let record = ActivityRecord::entity_change(
        user.profile.id,
        AuditAction::Update,
        SETTINGS_ENTITY,
        PERMISSIONS_ENTITY_ID,
    )
    .with_entity_name("Permission Settings")
    .with_before(before)
    .with_after(after.clone())
    .with_request_meta(meta);

    if let Err(e) = state.recorder.record_detached(record).await {
        tracing::warn!(error = %e, "Settings change recording task failed");
    }

    Ok(Json(after))
}

/// A validated settings update body.
#[derive(Debug, Default)]
struct SettingsUpdate {
    roles: Vec<(Role, PermissionPatch)>,
    users: Vec<(Uuid, Option<PermissionPatch>)>,
}

impl SettingsUpdate {
    fn parse(body: &JsonValue) -> Result<Self, ApiError> {
        let doc = body
            .as_object()
            .ok_or_else(|| ApiError::Validation("Request body must be an object".to_string()))?;

        let mut update = Self::default();

        for (key, raw) in section(doc, "rolePermissions")?.into_iter().flatten() {
            let role = key
                .parse::<Role>()
                .map_err(|_| ApiError::Validation(format!("Unknown role: {}", key)))?;
            let patch = PermissionPatch::from_document(raw).ok_or_else(|| {
                ApiError::Validation(format!("Invalid permissions for role {}", role))
            })?;
            update.roles.push((role, patch));
        }

        for (key, raw) in section(doc, "userPermissions")?.into_iter().flatten() {
            let user_id = Uuid::parse_str(key)
                .map_err(|_| ApiError::Validation(format!("Invalid user id: {}", key)))?;
            if raw.is_null() {
                update.users.push((user_id, None));
                continue;
            }
            let patch = PermissionPatch::from_document(raw).ok_or_else(|| {
                ApiError::Validation(format!("Invalid permissions for user {}", user_id))
            })?;
            update.users.push((user_id, Some(patch)));
        }

        Ok(update)
    }

    fn apply(&self, settings: &mut PermissionSettings) {
        for (role, patch) in &self.roles {
            settings.role_overrides.insert(*role, patch.to_replacement());
        }
        for (user_id, patch) in &self.users {
            match patch {
                Some(patch) => {
                    settings.user_overrides.insert(*user_id, patch.clone());
                }
                None => {
                    settings.user_overrides.remove(user_id);
                }
            }
        }
    }
}

/// An optional object-valued section of the body.
fn section<'a>(
    doc: &'a Map<String, JsonValue>,
    name: &str,
) -> Result<Option<&'a Map<String, JsonValue>>, ApiError> {
    match doc.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Object(entries)) => Ok(Some(entries)),
        Some(_) => Err(ApiError::Validation(format!("{} must be an object", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::Capability;
    use serde_json::json;

    #[test]
    fn test_parse_accepts_both_shapes() {
        let user_id = Uuid::new_v4();
        let user_key = user_id.to_string();
        let body = json!({
            "rolePermissions": {
                "manager": { "canViewDashboard": true, "canViewReports": false }
            },
            "userPermissions": {
                user_key: [{ "resource": "admin", "actions": ["read"] }]
            }
        });

        let update = SettingsUpdate::parse(&body).unwrap();
        assert_eq!(update.roles.len(), 1);
        assert_eq!(update.roles[0].0, Role::Manager);
        assert_eq!(update.users.len(), 1);

        let patch = update.users[0].1.as_ref().unwrap();
        assert_eq!(patch.get(Capability::ViewAdmin), Some(true));
        assert_eq!(patch.get(Capability::ManageAdmin), Some(false));
        assert_eq!(patch.get(Capability::ViewTrucks), None);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(SettingsUpdate::parse(&json!([])).is_err());
        assert!(SettingsUpdate::parse(&json!({ "rolePermissions": { "OWNER": {} } })).is_err());
        assert!(SettingsUpdate::parse(&json!({ "userPermissions": { "nope": {} } })).is_err());
        assert!(SettingsUpdate::parse(&json!({ "rolePermissions": { "ADMIN": "all" } })).is_err());
        assert!(SettingsUpdate::parse(&json!({ "rolePermissions": 3 })).is_err());
    }

    #[test]
    fn test_apply_replaces_and_removes() {
        let keep = Uuid::new_v4();
        let dropped = Uuid::new_v4();
        let mut settings = PermissionSettings::defaults();
        settings
            .user_overrides
            .insert(keep, PermissionPatch::new().with(Capability::ViewUsers, true));
        settings
            .user_overrides
            .insert(dropped, PermissionPatch::new().with(Capability::ViewAdmin, true));

        let dropped_key = dropped.to_string();
        let body = json!({
            "rolePermissions": { "USER": { "canViewDashboard": true } },
            "userPermissions": { dropped_key: null }
        });
        SettingsUpdate::parse(&body).unwrap().apply(&mut settings);

        let user_set = &settings.role_overrides[&Role::User];
        assert_eq!(user_set.len(), 1);
        assert!(user_set.contains(Capability::ViewDashboard));
        assert_eq!(
            settings.role_overrides[&Role::Admin],
            Role::Admin.default_permissions()
        );
        assert!(settings.user_overrides.contains_key(&keep));
        assert!(!settings.user_overrides.contains_key(&dropped));
    }
}
