//! Login session tracking middleware.
//!
//! On tracked paths an authenticated request without a live session opens
//! one: a login record is written, a LOGIN activity recorded and the new
//! session id set as a cookie on the response.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use domain::models::RequestMeta;
use domain::services::SessionStatus;

use crate::app::AppState;
use crate::extractors::client_meta::request_meta;
use crate::middleware::user_auth::UserAuth;

/// Must run after [`require_user_auth`](super::user_auth::require_user_auth).
///
/// Tracking failures are logged and the request continues.
pub async fn track_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.session.is_tracked(req.uri().path()) {
        return next.run(req).await;
    }
    let Some(user_id) = req.extensions().get::<UserAuth>().map(|a| a.user_id) else {
        return next.run(req).await;
    };

    let presented = state.cookies.extract(req.headers()).map(str::to_string);
    let meta: RequestMeta = request_meta(req.headers());

    let opened = match state
        .sessions
        .ensure_session(presented.as_deref(), user_id, &meta)
        .await
    {
        Ok(SessionStatus::Existing(handle)) => {
            req.extensions_mut().insert(handle);
            None
        }
        Ok(SessionStatus::Opened(opened)) => {
            req.extensions_mut().insert(opened.handle(user_id));
            Some(opened)
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = %user_id, "Failed to open login session");
            None
        }
    };

    let mut response = next.run(req).await;
    if let Some(opened) = opened {
        state.cookies.set(response.headers_mut(), &opened.session_id);
    }
    response
}
