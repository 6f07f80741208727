//! Audit log entity.

use chrono::{DateTime, Utc};
use domain::models::{AuditAction, AuditEntry};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::joined_user;

/// Database entity for audit logs, with the acting user's current profile
/// joined in.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntity {
    pub id: Uuid,

    /// CREATE, UPDATE or DELETE.
    pub action: String,

    pub entity_type: String,
    pub entity_id: String,

    pub user_id: Uuid,

    /// Actor identity as of the time the entry was written.
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_role: Option<String>,

    /// Diff for updates, full snapshot for creates and deletes, NULL for an
    /// update that changed nothing.
    pub changes: Option<serde_json::Value>,

    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,

    pub actor_name: Option<String>,
    pub actor_email: Option<String>,
    pub actor_role: Option<String>,
}

impl From<AuditLogEntity> for AuditEntry {
    fn from(entity: AuditLogEntity) -> Self {
        let action = entity.action.parse::<AuditAction>().unwrap_or_else(|e| {
            tracing::warn!(audit_log_id = %entity.id, error = %e, "Unexpected audit action");
            AuditAction::Update
        });
        Self {
            id: entity.id,
            action,
            entity_type: entity.entity_type,
            entity_id: entity.entity_id,
            user_id: entity.user_id,
            user_name: entity.user_name,
            user_email: entity.user_email,
            user_role: entity.user_role,
            changes: entity.changes,
            ip_address: entity.ip_address,
            user_agent: entity.user_agent,
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
