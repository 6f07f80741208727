//! Login session tracking and logout over HTTP.

mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use common::{body_json, get, get_with_cookie, post, set_cookie_header, set_cookie_pair, TestApp};
use domain::models::{ActivityAction, Role};
use serde_json::json;

#[tokio::test]
async fn test_first_tracked_request_opens_session() {
    let app = TestApp::new().await;
    let user = app.seed_user(Role::User).await;

    let response = app.send(get("/api/auth/me/permissions", user.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie_header(&response).expect("session cookie");
    assert!(cookie.starts_with("session-id=sess_"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=604800"));

    let sessions = app.store.login_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].user_id, user.id);
    assert!(sessions[0].is_active);
    assert_eq!(sessions[0].ip_address.as_deref(), Some("198.51.100.20"));

    let logins: Vec<_> = app
        .store
        .activity_entries()
        .await
        .into_iter()
        .filter(|a| a.action == ActivityAction::Login)
        .collect();
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].entity_type, "USER_SESSION");
    assert_eq!(logins[0].entity_id, Some(sessions[0].id.to_string()));
    assert_eq!(app.sessions.len().await, 1);
}

#[tokio::test]
async fn test_presented_session_is_reused() {
    let app = TestApp::new().await;
    let user = app.seed_user(Role::User).await;

    let first = app.send(get("/api/auth/me/permissions", user.id)).await;
    let cookie = set_cookie_pair(&first).expect("session cookie");

    for _ in 0..3 {
        let response = app
            .send(get_with_cookie("/api/auth/me/permissions", user.id, &cookie))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookie_header(&response).is_none());
    }

    assert_eq!(app.store.login_sessions().await.len(), 1);
    assert_eq!(app.store.activity_entries().await.len(), 1);
}

#[tokio::test]
async fn test_session_of_another_user_is_not_reused() {
    let app = TestApp::new().await;
    let alice = app.seed_user(Role::User).await;
    let bob = app.seed_user(Role::User).await;

    let first = app.send(get("/api/auth/me/permissions", alice.id)).await;
    let alice_cookie = set_cookie_pair(&first).expect("session cookie");

    let response = app
        .send(get_with_cookie("/api/auth/me/permissions", bob.id, &alice_cookie))
        .await;
    let bob_cookie = set_cookie_pair(&response).expect("new session cookie");
    assert_ne!(bob_cookie, alice_cookie);

    let sessions = app.store.login_sessions().await;
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().any(|s| s.user_id == bob.id));
}

#[tokio::test]
async fn test_malformed_cookie_opens_new_session() {
    let app = TestApp::new().await;
    let user = app.seed_user(Role::User).await;

    let response = app
        .send(get_with_cookie(
            "/api/auth/me/permissions",
            user.id,
            "session-id=not-a-session",
        ))
        .await;
    assert!(set_cookie_pair(&response).is_some());
    assert_eq!(app.store.login_sessions().await.len(), 1);
}

#[tokio::test]
async fn test_public_routes_are_not_tracked() {
    let app = TestApp::new().await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie_header(&response).is_none());
    assert!(app.store.login_sessions().await.is_empty());
}

#[tokio::test]
async fn test_logout_closes_session() {
    let app = TestApp::new().await;
    let user = app.seed_user(Role::Manager).await;

    let first = app.send(get("/api/auth/me/permissions", user.id)).await;
    let cookie = set_cookie_pair(&first).expect("session cookie");

    let response = app
        .send(post("/api/auth/logout", user.id, Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cleared = set_cookie_header(&response).expect("clearing cookie");
    assert!(cleared.starts_with("session-id=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Logged out successfully" })
    );

    let sessions = app.store.login_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert!(!sessions[0].is_active);
    assert!(sessions[0].logout_time.is_some());
    assert!(sessions[0].session_duration.unwrap() >= 0);
    assert!(app.sessions.is_empty().await);

    let logouts: Vec<_> = app
        .store
        .activity_entries()
        .await
        .into_iter()
        .filter(|a| a.action == ActivityAction::Logout)
        .collect();
    assert_eq!(logouts.len(), 1);
    assert_eq!(logouts[0].user_id, user.id);
    assert_eq!(logouts[0].entity_id, Some(sessions[0].id.to_string()));
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = TestApp::new().await;
    let user = app.seed_user(Role::User).await;

    let first = app.send(get("/api/auth/me/permissions", user.id)).await;
    let cookie = set_cookie_pair(&first).expect("session cookie");

    for _ in 0..2 {
        let response = app
            .send(post("/api/auth/logout", user.id, Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let sessions = app.store.login_sessions().await;
    assert_eq!(sessions.len(), 1);
    assert!(!sessions[0].is_active);
}

#[tokio::test]
async fn test_logout_without_cookie_does_not_open_session() {
    let app = TestApp::new().await;
    let user = app.seed_user(Role::User).await;

    let response = app.send(post("/api/auth/logout", user.id, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(app.store.login_sessions().await.is_empty());
    let activities = app.store.activity_entries().await;
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].action, ActivityAction::Logout);
    assert_eq!(activities[0].user_id, user.id);
}

#[tokio::test]
async fn test_logout_requires_authentication() {
    let app = TestApp::new().await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.store.activity_entries().await.is_empty());
}
