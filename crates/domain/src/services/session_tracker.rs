//! Login session tracking.
//!
//! A session opens on the first authenticated request that carries no valid
//! session id and closes on logout. Sessions that are never closed stay
//! active; that is a valid end state.

use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::json;
use shared::crypto::{generate_session_id, is_session_id};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::activity_recorder::{ActivityRecord, ActivityRecorder};
use super::store::{LoginHistoryStore, SessionRegistry, StoreError};
use crate::models::activity::USER_SESSION_ENTITY;
use crate::models::{session_duration, ActivityAction, NewLoginSession, RequestMeta, SessionHandle};

/// Error opening a session. Closing never fails.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to create login record: {0}")]
    LoginRecord(StoreError),

    #[error("Failed to register session: {0}")]
    Registry(StoreError),
}

/// A newly opened session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedSession {
    pub session_id: String,
    pub login_history_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl OpenedSession {
    /// The registry entry written for this session.
    pub fn handle(&self, user_id: Uuid) -> SessionHandle {
        SessionHandle {
            user_id,
            login_history_id: self.login_history_id,
            created_at: self.created_at,
        }
    }
}

/// Outcome of [`SessionTracker::ensure_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// The presented session id is tracked for this user.
    Existing(SessionHandle),
    /// A new session was opened; the id must be handed to the client.
    Opened(OpenedSession),
}

/// Opens and closes login sessions.
#[derive(Clone)]
pub struct SessionTracker {
    registry: Arc<dyn SessionRegistry>,
    history: Arc<dyn LoginHistoryStore>,
    recorder: ActivityRecorder,
}

impl SessionTracker {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        history: Arc<dyn LoginHistoryStore>,
        recorder: ActivityRecorder,
    ) -> Self {
        Self {
            registry,
            history,
            recorder,
        }
    }

    /// Reuses the presented session if it is tracked for `user_id`, otherwise
    /// opens a new one.
    pub async fn ensure_session(
        &self,
        presented: Option<&str>,
        user_id: Uuid,
        meta: &RequestMeta,
    ) -> Result<SessionStatus, SessionError> {
        if let Some(session_id) = presented.filter(|id| is_session_id(id)) {
            match self.registry.get(session_id).await {
                Ok(Some(handle)) if handle.user_id == user_id => {
                    return Ok(SessionStatus::Existing(handle));
                }
                Ok(Some(handle)) => tracing::warn!(
                    user_id = %user_id,
                    session_user_id = %handle.user_id,
                    "Session id belongs to another user; opening a new session"
                ),
                Ok(None) => tracing::debug!(user_id = %user_id, "Presented session is not tracked"),
                Err(e) => tracing::warn!(error = %e, "Failed to look up session"),
            }
        }

        self.open(user_id, meta).await.map(SessionStatus::Opened)
    }

    /// Opens a session: creates the login record, registers a fresh session
    /// id and records a LOGIN activity.
    pub async fn open(&self, user_id: Uuid, meta: &RequestMeta) -> Result<OpenedSession, SessionError> {
        let login = self
            .history
            .create(NewLoginSession::new(user_id, Utc::now(), meta))
            .await
            .map_err(SessionError::LoginRecord)?;

        let session_id = generate_session_id();
        let handle = SessionHandle {
            user_id,
            login_history_id: login.id,
            created_at: login.login_time,
        };
        self.registry
            .insert(&session_id, handle)
            .await
            .map_err(SessionError::Registry)?;

        counter!("login_sessions_opened_total").increment(1);
        tracing::info!(
            user_id = %user_id,
            login_history_id = %login.id,
            ip_address = %meta.ip_address,
            "Login session opened"
        );

        self.recorder
            .record(
                ActivityRecord::new(user_id, ActivityAction::Login, USER_SESSION_ENTITY)
                    .with_entity_id(login.id.to_string())
                    .with_entity_name("User Login")
                    .with_request_meta(meta.clone())
                    .with_metadata(json!({ "loginHistoryId": login.id })),
            )
            .await;

        Ok(OpenedSession {
            session_id,
            login_history_id: login.id,
            created_at: handle.created_at,
        })
    }

    /// Closes the session named by `session_id` and returns its duration in
    /// seconds.
    ///
    /// Idempotent: an unknown or already closed session yields `None`. A
    /// LOGOUT activity is recorded for the session's user, or for `user_id`
    /// when the session is not tracked.
    pub async fn close(
        &self,
        session_id: &str,
        user_id: Option<Uuid>,
        meta: Option<&RequestMeta>,
        now: DateTime<Utc>,
    ) -> Option<i64> {
        let handle = match self.registry.remove(session_id).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to remove session from registry");
                None
            }
        };

        let duration = match handle {
            Some(handle) => self.close_login(handle.login_history_id, now).await,
            None => {
                tracing::info!(user_id = ?user_id, "Logout for untracked session");
                None
            }
        };

        let Some(actor) = handle.map(|h| h.user_id).or(user_id) else {
            return duration;
        };

        let mut record = ActivityRecord::new(actor, ActivityAction::Logout, USER_SESSION_ENTITY)
            .with_entity_name("User Logout")
            .with_metadata(json!({
                "loginHistoryId": handle.map(|h| h.login_history_id),
                "sessionDuration": duration,
            }));
        if let Some(handle) = handle {
            record = record.with_entity_id(handle.login_history_id.to_string());
        }
        if let Some(meta) = meta {
            record = record.with_request_meta(meta.clone());
        }
        self.recorder.record(record).await;

        duration
    }

    async fn close_login(&self, login_history_id: Uuid, now: DateTime<Utc>) -> Option<i64> {
        let login = match self.history.find(login_history_id).await {
            Ok(Some(login)) if login.is_active => login,
            Ok(Some(_)) => {
                tracing::info!(login_history_id = %login_history_id, "Login session already closed");
                return None;
            }
            Ok(None) => {
                tracing::warn!(login_history_id = %login_history_id, "Login session not found");
                return None;
            }
            Err(e) => {
                tracing::error!(error = %e, login_history_id = %login_history_id, "Failed to load login session");
                return None;
            }
        };

        let duration = session_duration(login.login_time, now);
        match self.history.close(login_history_id, now, duration).await {
            Ok(Some(_)) => {
                counter!("login_sessions_closed_total").increment(1);
                tracing::info!(
                    user_id = %login.user_id,
                    login_history_id = %login_history_id,
                    session_duration = duration,
                    "Login session closed"
                );
                Some(duration)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, login_history_id = %login_history_id, "Failed to close login session");
                None
            }
        }
    }
}
