//! Administrative query routes over the audit trail, activity feed and
//! login history.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::{
    Action, ActivityEntry, ActivityQuery, AuditEntry, AuditLogQuery, LoginHistoryQuery,
    LoginSession, Resource, UserActivityReport,
};
use domain::services::summarize_user_activity;
use serde::{Deserialize, Serialize};
use shared::pagination::Page;
use shared::validation::{validate_date_range, validate_entity_type};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// Audit entry with a human-readable summary of its changes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryView {
    #[serde(flatten)]
    pub entry: AuditEntry,
    pub change_summary: String,
}

impl From<AuditEntry> for AuditEntryView {
    fn from(entry: AuditEntry) -> Self {
        let change_summary = entry.change_summary();
        Self {
            entry,
            change_summary,
        }
    }
}

fn check_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<(), ApiError> {
    validate_date_range(start, end).map_err(validation_error)
}

fn check_entity_type(entity_type: Option<&str>) -> Result<(), ApiError> {
    match entity_type {
        Some(value) => validate_entity_type(value).map_err(validation_error),
        None => Ok(()),
    }
}

fn validation_error(err: validator::ValidationError) -> ApiError {
    ApiError::Validation(
        err.message
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.code.to_string()),
    )
}

/// List audit log entries.
///
/// GET /api/admin/audit-logs
pub async fn list_audit_logs(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Page<AuditEntryView>>, ApiError> {
    user.require(Resource::Admin, Action::Read)?;
    check_window(query.start_date, query.end_date)?;
    check_entity_type(query.entity_type.as_deref())?;

    let page = state.stores.audit_logs.list(&query).await?;
    Ok(Json(page.map(AuditEntryView::from)))
}

/// List recorded user activities.
///
/// GET /api/admin/activities
pub async fn list_activities(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Page<ActivityEntry>>, ApiError> {
    user.require(Resource::Admin, Action::Read)?;
    check_window(query.start_date, query.end_date)?;
    check_entity_type(query.entity_type.as_deref())?;

    let page = state.stores.activities.list(&query).await?;
    Ok(Json(page))
}

/// List login sessions.
///
/// GET /api/admin/login-history
pub async fn list_login_history(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<LoginHistoryQuery>,
) -> Result<Json<Page<LoginSession>>, ApiError> {
    user.require(Resource::Admin, Action::Read)?;
    check_window(query.start_date, query.end_date)?;

    let page = state.stores.login_history.list(&query).await?;
    Ok(Json(page))
}

/// Query parameters for the user activity report.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityReportQuery {
    /// Comma-separated user ids. All users when absent.
    pub user_ids: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl UserActivityReportQuery {
    fn parse_user_ids(&self) -> Result<Option<Vec<Uuid>>, ApiError> {
        let Some(raw) = self.user_ids.as_deref() else {
            return Ok(None);
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Uuid::parse_str(s)
                    .map_err(|_| ApiError::Validation(format!("Invalid user id: {}", s)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

/// Per-user activity and session summary.
///
/// GET /api/admin/reports/user-activity
pub async fn user_activity_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<UserActivityReportQuery>,
) -> Result<Json<UserActivityReport>, ApiError> {
    user.require(Resource::Reports, Action::Read)?;
    check_window(query.start_date, query.end_date)?;
    let user_ids = query.parse_user_ids()?;

    let users = state.stores.users.list(user_ids.as_deref()).await?;

    let mut data = Vec::with_capacity(users.len());
    for profile in users {
        let activities = state
            .stores
            .activities
            .list_for_user(profile.id, query.start_date, query.end_date)
            .await?;
        let sessions = state
            .stores
            .login_history
            .list_for_user(profile.id, query.start_date, query.end_date)
            .await?;
        data.push(summarize_user_activity(
            profile.summary(),
            &activities,
            &sessions,
        ));
    }

    tracing::info!(
        user_id = %user.profile.id,
        total_users = data.len(),
        "Generated user activity report"
    );

    Ok(Json(UserActivityReport::new(data)))
}
