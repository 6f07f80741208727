//! Bearer token authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::jwt::{JwtError, TokenVerifier};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuth {
    /// User id from the token subject.
    pub user_id: Uuid,
    /// Token id.
    pub jti: String,
}

impl UserAuth {
    /// Validates a token and returns the caller.
    pub fn validate(verifier: &TokenVerifier, token: &str) -> Result<Self, JwtError> {
        let claims = verifier.verify(token)?;
        Ok(UserAuth {
            user_id: claims.user_id()?,
            jti: claims.jti,
        })
    }

    /// Authenticates from the `Authorization: Bearer` header.
    pub fn from_headers(verifier: &TokenVerifier, headers: &HeaderMap) -> Result<Self, ApiError> {
        let token = bearer_token(headers).ok_or_else(|| {
            ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
        })?;

        Self::validate(verifier, token).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })
    }
}

/// The token of a `Bearer` Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects requests without a valid bearer token.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match UserAuth::from_headers(&state.verifier, req.headers()) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
