//! Login history entity.

use chrono::{DateTime, Utc};
use domain::models::LoginSession;
use sqlx::FromRow;
use uuid::Uuid;

use super::user::joined_user;

/// Database entity for login history rows.
#[derive(Debug, Clone, FromRow)]
pub struct LoginHistoryEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub login_time: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
    /// Seconds, set on logout.
    pub session_duration: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_active: bool,
    pub actor_name: Option<String>,
    pub actor_email: Option<String>,
    pub actor_role: Option<String>,
}

impl From<LoginHistoryEntity> for LoginSession {
    fn from(entity: LoginHistoryEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            login_time: entity.login_time,
            logout_time: entity.logout_time,
            session_duration: entity.session_duration,
            ip_address: entity.ip_address,
            user_agent: entity.user_agent,
            is_active: entity.is_active,
            user: joined_user(
                entity.user_id,
                entity.actor_name,
                entity.actor_email,
                entity.actor_role,
            ),
        }
    }
}

/// Database row mapping for the user_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct UserSessionEntity {
    pub session_hash: String,
    pub user_id: Uuid,
    pub login_history_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<UserSessionEntity> for domain::models::SessionHandle {
    fn from(entity: UserSessionEntity) -> Self {
        Self {
            user_id: entity.user_id,
            login_history_id: entity.login_history_id,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_history_entity_to_domain() {
        let login = Utc::now();
        let entity = LoginHistoryEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            login_time: login,
            logout_time: None,
            session_duration: None,
            ip_address: Some("127.0.0.1".to_string()),
            user_agent: None,
            is_active: true,
            actor_name: Some("Kit".to_string()),
            actor_email: Some("kit@example.com".to_string()),
            actor_role: Some("USER".to_string()),
        };

        let session: LoginSession = entity.into();
        assert!(session.is_active);
        assert_eq!(session.user.unwrap().role, "USER");
    }

    #[test]
    fn test_user_session_entity_keeps_issue_time() {
        let created_at = Utc::now();
        let entity = UserSessionEntity {
            session_hash: "ab".repeat(32),
            user_id: Uuid::new_v4(),
            login_history_id: Uuid::new_v4(),
            created_at,
        };

        let handle: domain::models::SessionHandle = entity.clone().into();
        assert_eq!(handle.user_id, entity.user_id);
        assert_eq!(handle.created_at, created_at);
    }
}
