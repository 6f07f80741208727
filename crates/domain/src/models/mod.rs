//! Domain models for the fleet maintenance authorization core.

pub mod activity;
pub mod audit_log;
pub mod login_session;
pub mod permission;
pub mod permission_settings;
pub mod report;
pub mod request_meta;
pub mod role;
pub mod user;

pub use activity::{ActivityAction, ActivityEntry, ActivityQuery, NewActivityEntry};
pub use audit_log::{
    AuditAction, AuditEntry, AuditLogQuery, ChangeRecord, FieldChange, FieldChanges,
    NewAuditEntry,
};
pub use login_session::{
    session_duration, LoginHistoryQuery, LoginSession, NewLoginSession, SessionHandle,
};
pub use permission::{Action, Capability, PermissionPatch, PermissionSet, Resource};
pub use permission_settings::PermissionSettings;
pub use report::{UserActivityReport, UserActivitySummary};
pub use request_meta::RequestMeta;
pub use role::Role;
pub use user::{UserProfile, UserSummary};
