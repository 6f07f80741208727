use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    ActivityRecorder, ActivityStore, AuditLogStore, InMemorySessionRegistry, InMemoryStore,
    LoginHistoryStore, PermissionSettingsStore, SessionRegistry, SessionTracker, UserDirectory,
};
use persistence::repositories::{
    ActivityRepository, AuditLogRepository, LoginHistoryRepository, SessionRepository,
    SettingsRepository, UserRepository,
};
use shared::jwt::{JwtError, TokenVerifier};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, SessionStoreKind};
use crate::middleware::{metrics_handler, metrics_middleware, require_user_auth, trace_id, track_session};
use crate::routes::{admin, auth, health, settings};
use crate::services::SessionCookie;

/// Storage backends behind the domain traits.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserDirectory>,
    pub settings: Arc<dyn PermissionSettingsStore>,
    pub audit_logs: Arc<dyn AuditLogStore>,
    pub activities: Arc<dyn ActivityStore>,
    pub login_history: Arc<dyn LoginHistoryStore>,
    pub sessions: Arc<dyn SessionRegistry>,
}

impl Stores {
    /// PostgreSQL repositories. Sessions go to the `user_sessions` table or a
    /// process-local map depending on `session_store`.
    pub fn postgres(pool: &PgPool, session_store: SessionStoreKind) -> Self {
        let sessions: Arc<dyn SessionRegistry> = match session_store {
            SessionStoreKind::Database => Arc::new(SessionRepository::new(pool.clone())),
            SessionStoreKind::Memory => Arc::new(InMemorySessionRegistry::new()),
        };
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            settings: Arc::new(SettingsRepository::new(pool.clone())),
            audit_logs: Arc::new(AuditLogRepository::new(pool.clone())),
            activities: Arc::new(ActivityRepository::new(pool.clone())),
            login_history: Arc::new(LoginHistoryRepository::new(pool.clone())),
            sessions,
        }
    }

    /// Everything in one in-process store.
    pub fn in_memory(store: Arc<InMemoryStore>, sessions: Arc<InMemorySessionRegistry>) -> Self {
        Self {
            users: store.clone(),
            settings: store.clone(),
            audit_logs: store.clone(),
            activities: store.clone(),
            login_history: store,
            sessions,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: Arc<TokenVerifier>,
    pub stores: Stores,
    pub recorder: ActivityRecorder,
    pub sessions: SessionTracker,
    pub cookies: SessionCookie,
    /// Present when running against PostgreSQL; used by readiness checks.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(config: Config, stores: Stores, pool: Option<PgPool>) -> Result<Self, JwtError> {
        let verifier = Arc::new(config.jwt.verifier()?);
        let recorder = ActivityRecorder::new(
            stores.activities.clone(),
            stores.audit_logs.clone(),
            stores.users.clone(),
        );
        let sessions = SessionTracker::new(
            stores.sessions.clone(),
            stores.login_history.clone(),
            recorder.clone(),
        );
        let cookies = SessionCookie::new(&config.session);

        Ok(Self {
            config: Arc::new(config),
            verifier,
            stores,
            recorder,
            sessions,
            cookies,
            pool,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.server.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .server
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Authenticated routes that also open a login session when none is tracked.
    // Middleware order: auth runs first (outermost), then session tracking.
    let tracked_routes = Router::new()
        .route("/api/auth/me/permissions", get(auth::my_permissions))
        .route(
            "/api/settings/permissions",
            get(settings::get_permissions).put(settings::update_permissions),
        )
        .route("/api/admin/audit-logs", get(admin::list_audit_logs))
        .route("/api/admin/activities", get(admin::list_activities))
        .route("/api/admin/login-history", get(admin::list_login_history))
        .route(
            "/api/admin/reports/user-activity",
            get(admin::user_activity_report),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), track_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user_auth));

    // Logout must not open the session it is about to close.
    let logout_routes = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user_auth));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(tracked_routes)
        .merge(logout_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
