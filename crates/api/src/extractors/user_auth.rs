//! Authenticated caller extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::{Action, Resource, UserProfile};
use domain::services::{load_permission_settings, resolve_for_user, EffectivePermissions};

use crate::app::AppState;
use crate::error::ApiError;
pub use crate::middleware::user_auth::UserAuth;

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(auth.clone());
        }
        UserAuth::from_headers(&state.verifier, &parts.headers)
    }
}

/// The caller's current profile and effective permissions.
///
/// Resolved per request from the user directory and the stored settings, so
/// override changes apply immediately.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub profile: UserProfile,
    pub permissions: EffectivePermissions,
}

impl CurrentUser {
    /// Fails with 403 unless the caller may perform `action` on `resource`.
    pub fn require(&self, resource: Resource, action: Action) -> Result<(), ApiError> {
        if self.permissions.allows(resource, action) {
            Ok(())
        } else {
            tracing::info!(
                user_id = %self.profile.id,
                resource = %resource,
                action = %action,
                "Permission denied"
            );
            Err(ApiError::Forbidden(format!(
                "Missing permission {}:{}",
                resource, action
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = UserAuth::from_request_parts(parts, state).await?;

        let profile = state
            .stores
            .users
            .find(auth.user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        let settings = load_permission_settings(state.stores.settings.as_ref()).await;
        let permissions = resolve_for_user(&profile, &settings);

        Ok(CurrentUser {
            profile,
            permissions,
        })
    }
}
