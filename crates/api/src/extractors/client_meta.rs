//! Client address and user agent of the request.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use domain::models::RequestMeta;
use std::convert::Infallible;

/// Request metadata recorded with activity and login entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMeta(pub RequestMeta);

/// Reads the client address and user agent from forwarding headers.
pub fn request_meta(headers: &HeaderMap) -> RequestMeta {
    RequestMeta::from_headers(|name| headers.get(name).and_then(|v| v.to_str().ok()))
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientMeta(request_meta(&parts.headers)))
    }
}
