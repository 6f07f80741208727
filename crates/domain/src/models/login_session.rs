//! Login session lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::pagination::PageParams;
use uuid::Uuid;

use super::request_meta::RequestMeta;
use super::user::UserSummary;

/// Whole seconds between login and logout, floored and never negative.
pub fn session_duration(login_time: DateTime<Utc>, logout_time: DateTime<Utc>) -> i64 {
    (logout_time - login_time)
        .num_milliseconds()
        .div_euclid(1000)
        .max(0)
}

/// One login-to-logout span. A session that is never closed stays active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub login_time: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
    /// Seconds; set only once the session is closed.
    pub session_duration: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl LoginSession {
    /// Closes the session and returns the stored duration.
    ///
    /// Returns `None` without changes if the session is already closed.
    pub fn close(&mut self, logout_time: DateTime<Utc>) -> Option<i64> {
        if !self.is_active {
            return None;
        }
        let duration = session_duration(self.login_time, logout_time);
        self.logout_time = Some(logout_time);
        self.session_duration = Some(duration);
        self.is_active = false;
        Some(duration)
    }
}

/// What a tracked session id resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHandle {
    pub user_id: Uuid,
    pub login_history_id: Uuid,
    /// When the session id was issued. Registry entries older than the
    /// cookie lifetime are purged.
    pub created_at: DateTime<Utc>,
}

/// Input for opening a login session.
#[derive(Debug, Clone)]
pub struct NewLoginSession {
    pub user_id: Uuid,
    pub login_time: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewLoginSession {
    pub fn new(user_id: Uuid, login_time: DateTime<Utc>, meta: &RequestMeta) -> Self {
        Self {
            user_id,
            login_time,
            ip_address: Some(meta.ip_address.clone()),
            user_agent: meta.user_agent.clone(),
        }
    }
}

/// Query parameters for listing login history.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoginHistoryQuery {
    pub user_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl LoginHistoryQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams::new(self.limit, self.offset)
    }

    pub fn matches(&self, session: &LoginSession) -> bool {
        self.user_id.map_or(true, |id| session.user_id == id)
            && self.is_active.map_or(true, |a| session.is_active == a)
            && self.start_date.map_or(true, |start| session.login_time >= start)
            && self.end_date.map_or(true, |end| session.login_time <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn open_session() -> LoginSession {
        LoginSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            login_time: at(0),
            logout_time: None,
            session_duration: None,
            ip_address: Some("127.0.0.1".into()),
            user_agent: None,
            is_active: true,
            user: None,
        }
    }

    #[test]
    fn test_session_duration_whole_seconds() {
        assert_eq!(session_duration(at(0), at(125)), 125);
    }

    #[test]
    fn test_session_duration_floors() {
        let login = at(0);
        assert_eq!(session_duration(login, login + Duration::milliseconds(1999)), 1);
        assert_eq!(session_duration(login, login + Duration::milliseconds(999)), 0);
    }

    #[test]
    fn test_session_duration_never_negative() {
        assert_eq!(session_duration(at(10), at(0)), 0);
        assert_eq!(session_duration(at(0), at(0) - Duration::milliseconds(1)), 0);
    }

    #[test]
    fn test_close_session() {
        let mut session = open_session();
        assert_eq!(session.close(at(300)), Some(300));
        assert!(!session.is_active);
        assert_eq!(session.logout_time, Some(at(300)));
        assert_eq!(session.session_duration, Some(300));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut session = open_session();
        session.close(at(60));
        assert_eq!(session.close(at(600)), None);
        assert_eq!(session.session_duration, Some(60));
        assert_eq!(session.logout_time, Some(at(60)));
    }

    #[test]
    fn test_query_matches() {
        let session = open_session();
        let active = LoginHistoryQuery {
            is_active: Some(true),
            ..Default::default()
        };
        assert!(active.matches(&session));

        let closed = LoginHistoryQuery {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!closed.matches(&session));

        let other_user = LoginHistoryQuery {
            user_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(!other_user.matches(&session));
    }
}
