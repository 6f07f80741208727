//! A store that rejects every call.
//!
//! Compiled for tests and behind the `test-util` feature, for exercising
//! best-effort paths against a broken backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use shared::pagination::Page;
use uuid::Uuid;

use super::store::{
    ActivityStore, AuditLogStore, LoginHistoryStore, PermissionSettingsStore, SessionRegistry,
    StoreError, StoreResult, UserDirectory,
};
use crate::models::{
    ActivityEntry, ActivityQuery, AuditEntry, AuditLogQuery, LoginHistoryQuery, LoginSession,
    NewActivityEntry, NewAuditEntry, NewLoginSession, SessionHandle, UserProfile,
};

/// Store that fails every call.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

impl FailingStore {
    fn error<T>() -> StoreResult<T> {
        Err(StoreError::Unavailable("Simulated failure".to_string()))
    }
}

#[async_trait]
impl AuditLogStore for FailingStore {
    async fn insert(&self, _entry: NewAuditEntry) -> StoreResult<AuditEntry> {
        Self::error()
    }

    async fn list(&self, _query: &AuditLogQuery) -> StoreResult<Page<AuditEntry>> {
        Self::error()
    }
}

#[async_trait]
impl ActivityStore for FailingStore {
    async fn insert(&self, _entry: NewActivityEntry) -> StoreResult<ActivityEntry> {
        Self::error()
    }

    async fn list(&self, _query: &ActivityQuery) -> StoreResult<Page<ActivityEntry>> {
        Self::error()
    }

    async fn list_for_user(
        &self,
        _user_id: Uuid,
        _start: Option<DateTime<Utc>>,
        _end: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<ActivityEntry>> {
        Self::error()
    }
}

#[async_trait]
impl LoginHistoryStore for FailingStore {
    async fn create(&self, _session: NewLoginSession) -> StoreResult<LoginSession> {
        Self::error()
    }

    async fn find(&self, _id: Uuid) -> StoreResult<Option<LoginSession>> {
        Self::error()
    }

    async fn close(
        &self,
        _id: Uuid,
        _logout_time: DateTime<Utc>,
        _session_duration: i64,
    ) -> StoreResult<Option<LoginSession>> {
        Self::error()
    }

    async fn list(&self, _query: &LoginHistoryQuery) -> StoreResult<Page<LoginSession>> {
        Self::error()
    }

    async fn list_for_user(
        &self,
        _user_id: Uuid,
        _start: Option<DateTime<Utc>>,
        _end: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<LoginSession>> {
        Self::error()
    }
}

#[async_trait]
impl SessionRegistry for FailingStore {
    async fn insert(&self, _session_id: &str, _handle: SessionHandle) -> StoreResult<()> {
        Self::error()
    }

    async fn get(&self, _session_id: &str) -> StoreResult<Option<SessionHandle>> {
        Self::error()
    }

    async fn remove(&self, _session_id: &str) -> StoreResult<Option<SessionHandle>> {
        Self::error()
    }

    async fn purge_issued_before(&self, _cutoff: DateTime<Utc>) -> StoreResult<u64> {
        Self::error()
    }
}

#[async_trait]
impl UserDirectory for FailingStore {
    async fn find(&self, _user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        Self::error()
    }

    async fn list(&self, _ids: Option<&[Uuid]>) -> StoreResult<Vec<UserProfile>> {
        Self::error()
    }
}

#[async_trait]
impl PermissionSettingsStore for FailingStore {
    async fn load(&self) -> StoreResult<Option<JsonValue>> {
        Self::error()
    }

    async fn save(&self, _document: &JsonValue) -> StoreResult<()> {
        Self::error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_call_fails() {
        let store = FailingStore;
        assert!(matches!(
            SessionRegistry::get(&store, "sess_x").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(SessionRegistry::purge_issued_before(&store, Utc::now()).await.is_err());
        assert!(PermissionSettingsStore::load(&store).await.is_err());
    }
}
