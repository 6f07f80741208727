//! Permission settings repository.

use domain::services::{PermissionSettingsStore, StoreResult};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;

use super::store_error;
use crate::entities::SettingsEntity;
use crate::metrics::QueryTimer;

/// Repository for the single settings row.
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Splits a settings document into its two stored columns.
///
/// A missing or non-object part is stored as `{}`.
fn split_document(document: &JsonValue) -> (JsonValue, JsonValue) {
    let part = |key: &str| match document.get(key) {
        Some(value @ JsonValue::Object(_)) => value.clone(),
        _ => json!({}),
    };
    (part("rolePermissions"), part("userPermissions"))
}

#[async_trait::async_trait]
impl PermissionSettingsStore for SettingsRepository {
    async fn load(&self) -> StoreResult<Option<JsonValue>> {
        let timer = QueryTimer::new("find_permission_settings");
        let result = sqlx::query_as::<_, SettingsEntity>(
            "SELECT role_permissions, user_permissions, updated_at FROM settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result
            .map_err(store_error)?
            .map(SettingsEntity::into_document))
    }

    async fn save(&self, document: &JsonValue) -> StoreResult<()> {
        let (role_permissions, user_permissions) = split_document(document);

        let timer = QueryTimer::new("upsert_permission_settings");
        let result = sqlx::query(
            r#"
            INSERT INTO settings (id, role_permissions, user_permissions, updated_at)
            VALUES (1, $1, $2, NOW())
            ON CONFLICT (id) DO UPDATE
            SET role_permissions = EXCLUDED.role_permissions,
                user_permissions = EXCLUDED.user_permissions,
                updated_at = NOW()
            "#,
        )
        .bind(role_permissions)
        .bind(user_permissions)
        .execute(&self.pool)
        .await;
        timer.record();

        result.map(|_| ()).map_err(store_error)
    }
}
