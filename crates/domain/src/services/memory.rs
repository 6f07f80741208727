//! In-process storage implementations.
//!
//! `InMemorySessionRegistry` is the single-process session store.
//! `InMemoryStore` backs development runs and tests without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use shared::pagination::{Page, PageParams};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{
    ActivityStore, AuditLogStore, LoginHistoryStore, PermissionSettingsStore, SessionRegistry,
    StoreResult, UserDirectory,
};
use crate::models::{
    ActivityEntry, ActivityQuery, AuditEntry, AuditLogQuery, LoginHistoryQuery, LoginSession,
    NewActivityEntry, NewAuditEntry, NewLoginSession, SessionHandle, UserProfile, UserSummary,
};

/// Session registry backed by a process-local map.
#[derive(Debug, Default)]
pub struct InMemorySessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn insert(&self, session_id: &str, handle: SessionHandle) -> StoreResult<()> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), handle);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> StoreResult<Option<SessionHandle>> {
        Ok(self.sessions.read().await.get(session_id).copied())
    }

    async fn remove(&self, session_id: &str) -> StoreResult<Option<SessionHandle>> {
        Ok(self.sessions.write().await.remove(session_id))
    }

    async fn purge_issued_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| handle.created_at >= cutoff);
        Ok((before - sessions.len()) as u64)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, UserProfile>,
    audit_logs: Vec<AuditEntry>,
    activities: Vec<ActivityEntry>,
    login_history: Vec<LoginSession>,
    settings: Option<JsonValue>,
}

impl MemoryState {
    fn summary(&self, user_id: Uuid) -> Option<UserSummary> {
        self.users.get(&user_id).map(UserProfile::summary)
    }
}

/// Newest-first slice of `items` per `params`.
fn paginate<T>(mut items: Vec<T>, params: PageParams) -> Page<T> {
    let total = items.len() as i64;
    let start = (params.offset as usize).min(items.len());
    let end = start.saturating_add(params.limit as usize).min(items.len());
    let page: Vec<T> = items.drain(start..end).collect();
    Page::new(page, total, params)
}

fn in_window(at: DateTime<Utc>, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    start.map_or(true, |s| at >= s) && end.map_or(true, |e| at <= e)
}

/// Every record store held in one process-local state.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user profile.
    pub async fn put_user(&self, user: UserProfile) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.state.read().await.audit_logs.clone()
    }

    pub async fn activity_entries(&self) -> Vec<ActivityEntry> {
        self.state.read().await.activities.clone()
    }

    pub async fn login_sessions(&self) -> Vec<LoginSession> {
        self.state.read().await.login_history.clone()
    }
}

#[async_trait]
impl AuditLogStore for InMemoryStore {
    async fn insert(&self, entry: NewAuditEntry) -> StoreResult<AuditEntry> {
        let record = AuditEntry {
            id: Uuid::new_v4(),
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            user_id: entry.user_id,
            user_name: entry.user_name,
            user_email: entry.user_email,
            user_role: entry.user_role,
            changes: entry.changes,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            created_at: entry.created_at,
            user: None,
        };
        self.state.write().await.audit_logs.push(record.clone());
        Ok(record)
    }

    async fn list(&self, query: &AuditLogQuery) -> StoreResult<Page<AuditEntry>> {
        let state = self.state.read().await;
        let mut rows: Vec<AuditEntry> = state
            .audit_logs
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .map(|mut e| {
                e.user = state.summary(e.user_id);
                e
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(rows, query.page_params()))
    }
}

#[async_trait]
impl ActivityStore for InMemoryStore {
    async fn insert(&self, entry: NewActivityEntry) -> StoreResult<ActivityEntry> {
        let record = ActivityEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            entity_name: entry.entity_name,
            old_values: entry.old_values,
            new_values: entry.new_values,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            metadata: entry.metadata,
            created_at: entry.created_at,
            user: None,
        };
        self.state.write().await.activities.push(record.clone());
        Ok(record)
    }

    async fn list(&self, query: &ActivityQuery) -> StoreResult<Page<ActivityEntry>> {
        let state = self.state.read().await;
        let mut rows: Vec<ActivityEntry> = state
            .activities
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .map(|mut e| {
                e.user = state.summary(e.user_id);
                e
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(rows, query.page_params()))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<ActivityEntry>> {
        let state = self.state.read().await;
        let mut rows: Vec<ActivityEntry> = state
            .activities
            .iter()
            .filter(|e| e.user_id == user_id && in_window(e.created_at, start, end))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[async_trait]
impl LoginHistoryStore for InMemoryStore {
    async fn create(&self, session: NewLoginSession) -> StoreResult<LoginSession> {
        let record = LoginSession {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            login_time: session.login_time,
            logout_time: None,
            session_duration: None,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            is_active: true,
            user: None,
        };
        self.state.write().await.login_history.push(record.clone());
        Ok(record)
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<LoginSession>> {
        let state = self.state.read().await;
        Ok(state.login_history.iter().find(|s| s.id == id).cloned())
    }

    async fn close(
        &self,
        id: Uuid,
        logout_time: DateTime<Utc>,
        session_duration: i64,
    ) -> StoreResult<Option<LoginSession>> {
        let mut state = self.state.write().await;
        let Some(session) = state
            .login_history
            .iter_mut()
            .find(|s| s.id == id && s.is_active)
        else {
            return Ok(None);
        };
        session.logout_time = Some(logout_time);
        session.session_duration = Some(session_duration);
        session.is_active = false;
        Ok(Some(session.clone()))
    }

    async fn list(&self, query: &LoginHistoryQuery) -> StoreResult<Page<LoginSession>> {
        let state = self.state.read().await;
        let mut rows: Vec<LoginSession> = state
            .login_history
            .iter()
            .filter(|s| query.matches(s))
            .cloned()
            .map(|mut s| {
                s.user = state.summary(s.user_id);
                s
            })
            .collect();
        rows.sort_by(|a, b| b.login_time.cmp(&a.login_time));
        Ok(paginate(rows, query.page_params()))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<LoginSession>> {
        let state = self.state.read().await;
        let mut rows: Vec<LoginSession> = state
            .login_history
            .iter()
            .filter(|s| s.user_id == user_id && in_window(s.login_time, start, end))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.login_time.cmp(&a.login_time));
        Ok(rows)
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn list(&self, ids: Option<&[Uuid]>) -> StoreResult<Vec<UserProfile>> {
        let state = self.state.read().await;
        let mut users: Vec<UserProfile> = state
            .users
            .values()
            .filter(|u| ids.map_or(true, |ids| ids.contains(&u.id)))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }
}

#[async_trait]
impl PermissionSettingsStore for InMemoryStore {
    async fn load(&self) -> StoreResult<Option<JsonValue>> {
        Ok(self.state.read().await.settings.clone())
    }

    async fn save(&self, document: &JsonValue) -> StoreResult<()> {
        self.state.write().await.settings = Some(document.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityAction, AuditAction, RequestMeta, Role};
    use chrono::Duration;

    fn activity(user_id: Uuid, action: ActivityAction, at: DateTime<Utc>) -> NewActivityEntry {
        NewActivityEntry {
            user_id,
            action,
            entity_type: "truck".to_string(),
            entity_id: None,
            entity_name: None,
            old_values: None,
            new_values: None,
            ip_address: None,
            user_agent: None,
            metadata: None,
            created_at: at,
        }
    }

    #[tokio::test]
    async fn test_session_registry_insert_get_remove() {
        let registry = InMemorySessionRegistry::new();
        let handle = SessionHandle {
            user_id: Uuid::new_v4(),
            login_history_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        registry.insert("sess_a", handle).await.unwrap();
        assert_eq!(registry.get("sess_a").await.unwrap(), Some(handle));
        assert_eq!(registry.len().await, 1);

        assert_eq!(registry.remove("sess_a").await.unwrap(), Some(handle));
        assert_eq!(registry.remove("sess_a").await.unwrap(), None);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_session_registry_purges_stale_entries() {
        let registry = InMemorySessionRegistry::new();
        let now = Utc::now();
        let handle = |age: Duration| SessionHandle {
            user_id: Uuid::new_v4(),
            login_history_id: Uuid::new_v4(),
            created_at: now - age,
        };

        registry.insert("sess_old", handle(Duration::days(8))).await.unwrap();
        registry.insert("sess_new", handle(Duration::hours(1))).await.unwrap();

        let cutoff = now - Duration::days(7);
        assert_eq!(registry.purge_issued_before(cutoff).await.unwrap(), 1);
        assert!(registry.get("sess_old").await.unwrap().is_none());
        assert!(registry.get("sess_new").await.unwrap().is_some());
        assert_eq!(registry.purge_issued_before(cutoff).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_activity_list_newest_first_with_user() {
        let store = InMemoryStore::new();
        let user = UserProfile {
            id: Uuid::new_v4(),
            name: "Lee Park".into(),
            email: "lee@example.com".into(),
            role: Role::Manager,
            permissions: None,
        };
        store.put_user(user.clone()).await;

        let now = Utc::now();
        for i in 0..5 {
            ActivityStore::insert(
                &store,
                activity(user.id, ActivityAction::View, now - Duration::minutes(i)),
            )
            .await
            .unwrap();
        }

        let page = ActivityStore::list(
            &store,
            &ActivityQuery {
                limit: Some(2),
                offset: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].created_at > page.items[1].created_at);
        assert_eq!(page.items[0].created_at, now - Duration::minutes(1));
        assert_eq!(page.items[0].user.as_ref().unwrap().email, "lee@example.com");
    }

    #[tokio::test]
    async fn test_offset_past_end_is_empty() {
        let store = InMemoryStore::new();
        let entry = NewAuditEntry::new(AuditAction::Create, "truck", "t-1", Uuid::new_v4());
        AuditLogStore::insert(&store, entry).await.unwrap();

        let page = AuditLogStore::list(
            &store,
            &AuditLogQuery {
                offset: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_close_only_active_sessions() {
        let store = InMemoryStore::new();
        let opened = store
            .create(NewLoginSession::new(
                Uuid::new_v4(),
                Utc::now(),
                &RequestMeta::default(),
            ))
            .await
            .unwrap();

        let closed = store.close(opened.id, Utc::now(), 42).await.unwrap().unwrap();
        assert!(!closed.is_active);
        assert_eq!(closed.session_duration, Some(42));

        assert!(store.close(opened.id, Utc::now(), 99).await.unwrap().is_none());
        assert!(store.close(Uuid::new_v4(), Utc::now(), 1).await.unwrap().is_none());
    }
}
