//! User activity entity.

use chrono::{DateTime, Utc};
use domain::models::{ActivityAction, ActivityEntry};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::joined_user;

/// Database entity for user activities.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub actor_name: Option<String>,
    pub actor_email: Option<String>,
    pub actor_role: Option<String>,
}

impl From<ActivityEntity> for ActivityEntry {
    fn from(entity: ActivityEntity) -> Self {
        let action = entity.action.parse::<ActivityAction>().unwrap_or_else(|e| {
            tracing::warn!(activity_id = %entity.id, error = %e, "Unexpected activity action");
            ActivityAction::View
        });
        Self {
            id: entity.id,
            user_id: entity.user_id,
            action,
            entity_type: entity.entity_type,
            entity_id: entity.entity_id,
            entity_name: entity.entity_name,
            old_values: entity.old_values,
            new_values: entity.new_values,
            ip_address: entity.ip_address,
            user_agent: entity.user_agent,
            metadata: entity.metadata,
            created_at: entity.created_at,
            user: joined_user(
                entity.user_id,
                entity.actor_name,
                entity.actor_email,
                entity.actor_role,
            ),
        }
    }
}
