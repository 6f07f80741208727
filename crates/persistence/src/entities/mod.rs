//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod activity;
pub mod audit_log;
pub mod login_history;
pub mod settings;
pub mod user;

pub use activity::ActivityEntity;
pub use audit_log::AuditLogEntity;
pub use login_history::{LoginHistoryEntity, UserSessionEntity};
pub use settings::SettingsEntity;
pub use user::UserEntity;
