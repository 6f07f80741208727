//! Storage interfaces the core depends on.
//!
//! The persistence crate provides PostgreSQL implementations; `memory`
//! provides in-process ones.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use shared::pagination::Page;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ActivityEntry, ActivityQuery, AuditEntry, AuditLogQuery, LoginHistoryQuery, LoginSession,
    NewActivityEntry, NewAuditEntry, NewLoginSession, PermissionSettings, SessionHandle,
    UserProfile,
};

/// Error returned by storage implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Append-only audit entry storage.
#[async_trait::async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn insert(&self, entry: NewAuditEntry) -> StoreResult<AuditEntry>;

    /// Newest first, with the acting user attached.
    async fn list(&self, query: &AuditLogQuery) -> StoreResult<Page<AuditEntry>>;
}

/// Append-only activity entry storage.
#[async_trait::async_trait]
pub trait ActivityStore: Send + Sync {
    async fn insert(&self, entry: NewActivityEntry) -> StoreResult<ActivityEntry>;

    /// Newest first, with the acting user attached.
    async fn list(&self, query: &ActivityQuery) -> StoreResult<Page<ActivityEntry>>;

    /// Every activity of one user in an optional window, newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<ActivityEntry>>;
}

/// Login session records.
#[async_trait::async_trait]
pub trait LoginHistoryStore: Send + Sync {
    async fn create(&self, session: NewLoginSession) -> StoreResult<LoginSession>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<LoginSession>>;

    /// Marks an active session closed. Returns `None` if the session does not
    /// exist or is already closed.
    async fn close(
        &self,
        id: Uuid,
        logout_time: DateTime<Utc>,
        session_duration: i64,
    ) -> StoreResult<Option<LoginSession>>;

    /// Newest login first, with the user attached.
    async fn list(&self, query: &LoginHistoryQuery) -> StoreResult<Page<LoginSession>>;

    /// Every session of one user whose login falls in an optional window,
    /// newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<LoginSession>>;
}

/// Maps opaque session ids to the session they track.
#[async_trait::async_trait]
pub trait SessionRegistry: Send + Sync {
    async fn insert(&self, session_id: &str, handle: SessionHandle) -> StoreResult<()>;

    async fn get(&self, session_id: &str) -> StoreResult<Option<SessionHandle>>;

    async fn remove(&self, session_id: &str) -> StoreResult<Option<SessionHandle>>;

    /// Drops entries issued before `cutoff` and returns how many were
    /// removed. The login records they point at are left untouched.
    async fn purge_issued_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}

/// Read access to current user profiles.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>>;

    /// Users with the given ids, or every user when `ids` is `None`.
    async fn list(&self, ids: Option<&[Uuid]>) -> StoreResult<Vec<UserProfile>>;
}

/// The single stored permission settings document.
#[async_trait::async_trait]
pub trait PermissionSettingsStore: Send + Sync {
    /// The raw `{rolePermissions, userPermissions}` document, if one is stored.
    async fn load(&self) -> StoreResult<Option<JsonValue>>;

    async fn save(&self, document: &JsonValue) -> StoreResult<()>;
}

/// Loads and normalises the settings snapshot.
///
/// A missing document or a failed load resolves to no overrides, so every
/// user falls back to their role default.
pub async fn load_permission_settings(store: &dyn PermissionSettingsStore) -> PermissionSettings {
    match store.load().await {
        Ok(Some(document)) => PermissionSettings::from_json(&document),
        Ok(None) => PermissionSettings::empty(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load permission settings; using role defaults");
            PermissionSettings::empty()
        }
    }
}
