//! Domain services for the fleet maintenance authorization core.
//!
//! Permission resolution and diffing are pure. Recording and session tracking
//! go through the storage traits in `store`.

pub mod activity_recorder;
pub mod activity_summary;
pub mod diff;
#[cfg(any(test, feature = "test-util"))]
pub mod failing;
pub mod memory;
pub mod permission_resolver;
pub mod session_tracker;
pub mod store;

pub use activity_recorder::{ActivityRecord, ActivityRecorder, RECORDS_DROPPED_METRIC};
pub use activity_summary::summarize_user_activity;
pub use diff::{change_record, diff};
#[cfg(any(test, feature = "test-util"))]
pub use failing::FailingStore;
pub use memory::{InMemorySessionRegistry, InMemoryStore};
pub use permission_resolver::{
    resolve_for_user, resolve_permissions, EffectivePermissions, PermissionSource,
};
pub use session_tracker::{OpenedSession, SessionError, SessionStatus, SessionTracker};
pub use store::{
    load_permission_settings, ActivityStore, AuditLogStore, LoginHistoryStore,
    PermissionSettingsStore, SessionRegistry, StoreError, StoreResult, UserDirectory,
};
