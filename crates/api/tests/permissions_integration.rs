//! Effective permissions and permission settings over HTTP.

mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use common::{body_json, get, put_json, TestApp};
use domain::models::{ActivityAction, AuditAction, Role};
use domain::services::PermissionSettingsStore;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_my_permissions_uses_role_default() {
    let app = TestApp::new().await;
    let user = app.seed_user(Role::User).await;

    let response = app.send(get("/api/auth/me/permissions", user.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["userId"], json!(user.id));
    assert_eq!(body["role"], "USER");
    assert_eq!(body["source"], "role_default");
    assert_eq!(body["permissions"]["canViewDashboard"], true);
    assert_eq!(body["permissions"]["canViewTrucks"], true);
    assert_eq!(body["permissions"]["canAddTrucks"], false);
    assert_eq!(body["permissions"]["canViewAdmin"], false);
    assert_eq!(body["permissions"].as_object().unwrap().len(), 20);
}

#[tokio::test]
async fn test_my_permissions_honours_user_record_override() {
    let app = TestApp::new().await;
    let user = app
        .seed_user_with(
            Role::User,
            Some(json!([{ "resource": "trucks", "actions": ["read", "create"] }])),
        )
        .await;

    let body = body_json(app.send(get("/api/auth/me/permissions", user.id)).await).await;
    assert_eq!(body["source"], "entity_override");
    assert_eq!(body["permissions"]["canAddTrucks"], true);
    assert_eq!(body["permissions"]["canEditTrucks"], false);
    assert_eq!(body["permissions"]["canViewDashboard"], true);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/auth/me/permissions")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_unknown_user_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app.send(get("/api/auth/me/permissions", Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_settings_get_seeds_defaults() {
    let app = TestApp::new().await;
    let admin = app.seed_user(Role::Admin).await;
    assert!(app.store.load().await.unwrap().is_none());

    let response = app.send(get("/api/settings/permissions", admin.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["rolePermissions"]["ADMIN"]["canManageAdmin"], true);
    assert_eq!(body["rolePermissions"]["MANAGER"]["canViewReports"], true);
    assert_eq!(body["rolePermissions"]["MANAGER"]["canDeleteTrucks"], false);
    assert_eq!(body["rolePermissions"]["USER"]["canViewUsers"], false);
    assert_eq!(body["userPermissions"], json!({}));

    assert_eq!(app.store.load().await.unwrap(), Some(body));
}

#[tokio::test]
async fn test_settings_read_and_write_are_gated() {
    let app = TestApp::new().await;
    let user = app.seed_user(Role::User).await;
    let manager = app.seed_user(Role::Manager).await;

    let response = app.send(get("/api/settings/permissions", user.id)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.send(get("/api/settings/permissions", manager.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json!({ "rolePermissions": { "MANAGER": { "canManageSettings": true } } });
    let response = app
        .send(put_json("/api/settings/permissions", manager.id, &body))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "forbidden");
    assert!(app.store.audit_entries().await.is_empty());
}

#[tokio::test]
async fn test_settings_update_grants_user_override() {
    let app = TestApp::new().await;
    let admin = app.seed_user(Role::Admin).await;
    let user = app.seed_user(Role::User).await;

    let response = app.send(get("/api/admin/activities", user.id)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let user_key = user.id.to_string();
    let body = json!({
        "userPermissions": {
            user_key.clone(): [{ "resource": "admin", "actions": ["read"] }]
        }
    });
    let response = app
        .send(put_json("/api/settings/permissions", admin.id, &body))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let saved = body_json(response).await;
    assert_eq!(saved["userPermissions"][&user_key]["canViewAdmin"], true);
    assert_eq!(saved["userPermissions"][&user_key]["canManageAdmin"], false);
    assert!(saved["userPermissions"][&user_key].get("canViewTrucks").is_none());

    let response = app.send(get("/api/admin/activities", user.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let me = body_json(app.send(get("/api/auth/me/permissions", user.id)).await).await;
    assert_eq!(me["source"], "user_override");
    assert_eq!(me["permissions"]["canViewAdmin"], true);
    assert_eq!(me["permissions"]["canViewTrucks"], true);
}

#[tokio::test]
async fn test_settings_update_replaces_role_matrix() {
    let app = TestApp::new().await;
    let admin = app.seed_user(Role::Admin).await;
    let user = app.seed_user(Role::User).await;

    let body = json!({ "rolePermissions": { "user": { "canViewDashboard": true } } });
    let response = app
        .send(put_json("/api/settings/permissions", admin.id, &body))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let me = body_json(app.send(get("/api/auth/me/permissions", user.id)).await).await;
    assert_eq!(me["source"], "role_override");
    assert_eq!(me["permissions"]["canViewDashboard"], true);
    assert_eq!(me["permissions"]["canViewTrucks"], false);
}

#[tokio::test]
async fn test_settings_update_records_activity_and_audit() {
    let app = TestApp::new().await;
    let admin = app.seed_user(Role::Admin).await;
    let user = app.seed_user(Role::User).await;

    let user_key = user.id.to_string();
    let body = json!({ "userPermissions": { user_key.clone(): { "canViewReports": true } } });
    let response = app
        .send(put_json("/api/settings/permissions", admin.id, &body))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let audits = app.store.audit_entries().await;
    assert_eq!(audits.len(), 1);
    let audit = &audits[0];
    assert_eq!(audit.action, AuditAction::Update);
    assert_eq!(audit.entity_type, "settings");
    assert_eq!(audit.entity_id, "permissions");
    assert_eq!(audit.user_id, admin.id);
    assert_eq!(audit.user_email.as_deref(), Some(admin.email.as_str()));
    assert_eq!(audit.ip_address.as_deref(), Some("198.51.100.20"));

    let changes = audit.changes.as_ref().unwrap();
    assert!(changes.get("rolePermissions").is_none());
    assert_eq!(changes["userPermissions"]["from"], json!({}));
    assert_eq!(
        changes["userPermissions"]["to"][&user_key]["canViewReports"],
        true
    );

    let updates: Vec<_> = app
        .store
        .activity_entries()
        .await
        .into_iter()
        .filter(|a| a.action == ActivityAction::Update)
        .collect();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].entity_type, "settings");
    assert_eq!(updates[0].user_agent.as_deref(), Some("FleetTests/1.0"));
    assert!(updates[0].new_values.is_some());
}

#[tokio::test]
async fn test_settings_update_null_removes_user_override() {
    let app = TestApp::new().await;
    let admin = app.seed_user(Role::Admin).await;
    let user = app.seed_user(Role::User).await;
    let user_key = user.id.to_string();

    let grant = json!({ "userPermissions": { &user_key: { "canViewAdmin": true } } });
    app.send(put_json("/api/settings/permissions", admin.id, &grant))
        .await;

    let revoke = json!({ "userPermissions": { &user_key: null } });
    let response = app
        .send(put_json("/api/settings/permissions", admin.id, &revoke))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["userPermissions"], json!({}));

    let response = app.send(get("/api/admin/activities", user.id)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_settings_update_rejects_invalid_body() {
    let app = TestApp::new().await;
    let admin = app.seed_user(Role::Admin).await;

    for body in [
        json!(["not", "an", "object"]),
        json!({ "rolePermissions": { "OWNER": { "canViewDashboard": true } } }),
        json!({ "userPermissions": { "not-a-uuid": { "canViewDashboard": true } } }),
        json!({ "rolePermissions": { "ADMIN": "everything" } }),
    ] {
        let response = app
            .send(put_json("/api/settings/permissions", admin.id, &body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    assert!(app.store.audit_entries().await.is_empty());
    assert!(app.store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_settings_update_succeeds_when_recording_fails() {
    let app = TestApp::with_failing_recorder().await;
    let admin = app.seed_user(Role::Admin).await;
    let user = app.seed_user(Role::User).await;

    let body = json!({ "rolePermissions": { "USER": { "canViewReports": true } } });
    let response = app
        .send(put_json("/api/settings/permissions", admin.id, &body))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["rolePermissions"]["USER"]["canViewReports"],
        true
    );

    let saved = app.store.load().await.unwrap().expect("settings saved");
    assert_eq!(saved["rolePermissions"]["USER"]["canViewReports"], true);
    assert!(app.store.audit_entries().await.is_empty());
    assert!(app.store.activity_entries().await.is_empty());

    let me = body_json(app.send(get("/api/auth/me/permissions", user.id)).await).await;
    assert_eq!(me["source"], "role_override");
    assert_eq!(me["permissions"]["canViewReports"], true);
}
