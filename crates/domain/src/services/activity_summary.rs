//! Per-user activity report aggregation.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::models::{ActivityEntry, LoginSession, UserActivitySummary, UserSummary};

/// Aggregates one user's activities and sessions.
///
/// Sessions without a stored duration add nothing to the total but still
/// count toward the average's denominator.
pub fn summarize_user_activity(
    user: UserSummary,
    activities: &[ActivityEntry],
    sessions: &[LoginSession],
) -> UserActivitySummary {
    let mut action_counts: BTreeMap<String, i64> = BTreeMap::new();
    for activity in activities {
        *action_counts.entry(activity.action.to_string()).or_default() += 1;
    }

    let total_session_time: i64 = sessions.iter().filter_map(|s| s.session_duration).sum();
    let average_session_time = if sessions.is_empty() {
        0.0
    } else {
        total_session_time as f64 / sessions.len() as f64
    };

    UserActivitySummary {
        user,
        total_activities: activities.len() as i64,
        action_counts,
        total_logins: sessions.len() as i64,
        total_session_time,
        average_session_time,
        last_activity: latest(activities.iter().map(|a| a.created_at)),
        last_login: latest(sessions.iter().map(|s| s.login_time)),
    }
}

fn latest(times: impl Iterator<Item = DateTime<Utc>>) -> Option<DateTime<Utc>> {
    times.max()
}
