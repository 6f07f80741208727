//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Role, UserProfile, UserSummary};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub permissions: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for UserProfile {
    fn from(entity: UserEntity) -> Self {
        let role = entity.role.parse::<Role>().unwrap_or_else(|_| {
            tracing::warn!(user_id = %entity.id, role = %entity.role, "Unknown role on user record; treating as USER");
            Role::User
        });
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            role,
            permissions: entity.permissions,
        }
    }
}

/// Acting-user columns joined onto audit, activity and login rows.
///
/// All `None` when the user no longer exists.
pub(crate) fn joined_user(
    id: Uuid,
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
) -> Option<UserSummary> {
    Some(UserSummary {
        id,
        name: name?,
        email: email?,
        role: role?,
    })
}
