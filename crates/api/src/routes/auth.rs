//! Caller-scoped auth routes.

use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use domain::models::activity::USER_SESSION_ENTITY;
use domain::models::ActivityAction;
use domain::services::{ActivityRecord, PermissionSource};
use serde::Serialize;
use serde_json::{json, Map, Value as JsonValue};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientMeta, CurrentUser, UserAuth};

/// Response for `GET /api/auth/me/permissions`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyPermissionsResponse {
    pub user_id: Uuid,
    pub role: String,
    pub source: PermissionSource,
    pub permissions: Map<String, JsonValue>,
}

/// The caller's effective permission matrix.
pub async fn my_permissions(user: CurrentUser) -> Result<Json<MyPermissionsResponse>, ApiError> {
    Ok(Json(MyPermissionsResponse {
        user_id: user.profile.id,
        role: user.permissions.role().to_string(),
        source: user.permissions.source(),
        permissions: user.permissions.to_flags(),
    }))
}

/// Closes the session named by the cookie and clears it.
///
/// Always succeeds for an authenticated caller, even when the session is
/// unknown or already closed.
pub async fn logout(
    State(state): State<AppState>,
    auth: UserAuth,
    ClientMeta(meta): ClientMeta,
    headers: HeaderMap,
) -> (HeaderMap, Json<JsonValue>) {
    match state.cookies.extract(&headers) {
        Some(session_id) => {
            let duration = state
                .sessions
                .close(session_id, Some(auth.user_id), Some(&meta), Utc::now())
                .await;
            tracing::info!(user_id = %auth.user_id, session_duration = ?duration, "User logged out");
        }
        None => {
            tracing::info!(user_id = %auth.user_id, "Logout without a session cookie");
            state
                .recorder
                .record(
                    ActivityRecord::new(auth.user_id, ActivityAction::Logout, USER_SESSION_ENTITY)
                        .with_entity_name("User Logout")
                        .with_request_meta(meta),
                )
                .await;
        }
    }

    let mut response_headers = HeaderMap::new();
    state.cookies.clear(&mut response_headers);

    (
        response_headers,
        Json(json!({ "message": "Logged out successfully" })),
    )
}
