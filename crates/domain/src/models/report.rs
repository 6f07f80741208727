//! Per-user activity report shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::user::UserSummary;

/// Activity and session totals for one user over a reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivitySummary {
    pub user: UserSummary,
    pub total_activities: i64,
    /// Activity count keyed by action name.
    pub action_counts: BTreeMap<String, i64>,
    pub total_logins: i64,
    /// Seconds, summed over closed sessions.
    pub total_session_time: i64,
    /// Seconds, averaged over every session in the window.
    pub average_session_time: f64,
    pub last_activity: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

/// The `user-summary` report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityReport {
    #[serde(rename = "type")]
    pub report_type: String,
    pub generated_at: DateTime<Utc>,
    pub total_users: i64,
    pub data: Vec<UserActivitySummary>,
}

impl UserActivityReport {
    pub fn new(data: Vec<UserActivitySummary>) -> Self {
        Self {
            report_type: "user-summary".to_string(),
            generated_at: Utc::now(),
            total_users: data.len() as i64,
            data,
        }
    }
}
