//! Shared helpers for API integration tests.
//!
//! The router runs against in-memory stores, so no database is required.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use domain::models::{Role, UserProfile};
use domain::services::{FailingStore, InMemorySessionRegistry, InMemoryStore};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use fleet_maintenance_api::{
    app::{create_app, AppState, Stores},
    config::Config,
};
use serde_json::Value;
use shared::jwt::TokenSigner;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Secret used by `Config::load_for_test`.
pub const TEST_JWT_SECRET: &str = "test_secret_key_for_jwt_testing_12345";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub sessions: Arc<InMemorySessionRegistry>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(|_| {})
    }

    /// Audit log and activity writes fail; everything else is in memory.
    pub async fn with_failing_recorder() -> Self {
        Self::build(|stores| {
            stores.audit_logs = Arc::new(FailingStore);
            stores.activities = Arc::new(FailingStore);
        })
    }

    fn build(customize: impl FnOnce(&mut Stores)) -> Self {
        let config = Config::load_for_test(&[]).expect("test config");
        let store = Arc::new(InMemoryStore::new());
        let sessions = Arc::new(InMemorySessionRegistry::new());
        let mut stores = Stores::in_memory(store.clone(), sessions.clone());
        customize(&mut stores);
        let state = AppState::new(config, stores, None).expect("app state");

        Self {
            router: create_app(state),
            store,
            sessions,
        }
    }

    /// Adds a user with the given role and no per-user override.
    pub async fn seed_user(&self, role: Role) -> UserProfile {
        self.seed_user_with(role, None).await
    }

    pub async fn seed_user_with(&self, role: Role, permissions: Option<Value>) -> UserProfile {
        let user = UserProfile {
            id: Uuid::new_v4(),
            name: Name().fake(),
            email: SafeEmail().fake(),
            role,
            permissions,
        };
        self.store.put_user(user.clone()).await;
        user
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

/// Signs a valid access token for `user_id`.
pub fn token_for(user_id: Uuid) -> String {
    TokenSigner::hs256(TEST_JWT_SECRET, 3600)
        .sign(user_id)
        .expect("sign token")
}

pub fn get(uri: &str, user_id: Uuid) -> Request<Body> {
    authed(Method::GET, uri, user_id, None, Body::empty())
}

pub fn get_with_cookie(uri: &str, user_id: Uuid, cookie: &str) -> Request<Body> {
    authed(Method::GET, uri, user_id, Some(cookie), Body::empty())
}

pub fn put_json(uri: &str, user_id: Uuid, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user_id)))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "FleetTests/1.0")
        .header("x-forwarded-for", "198.51.100.20")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn post(uri: &str, user_id: Uuid, cookie: Option<&str>) -> Request<Body> {
    authed(Method::POST, uri, user_id, cookie, Body::empty())
}

fn authed(
    method: Method,
    uri: &str,
    user_id: Uuid,
    cookie: Option<&str>,
    body: Body,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user_id)))
        .header(header::USER_AGENT, "FleetTests/1.0")
        .header("x-forwarded-for", "198.51.100.20");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(body).expect("request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// The `name=value` pair of the response's Set-Cookie header, if any.
pub fn set_cookie_pair(response: &Response<Body>) -> Option<String> {
    set_cookie_header(response)
        .and_then(|v| v.split(';').next().map(|pair| pair.trim().to_string()))
}

pub fn set_cookie_header(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
