//! Session cookie handling.
//!
//! The browsing-session id travels in an httpOnly cookie. The cookie only
//! names the session; authentication still comes from the bearer token.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};

use crate::config::SessionConfig;

/// Builds, reads and clears the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    max_age_secs: i64,
    secure: bool,
}

impl SessionCookie {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            max_age_secs: config.max_age_secs,
            secure: config.secure,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set-Cookie value carrying a session id.
    pub fn build(&self, session_id: &str) -> String {
        self.with_attributes(format!(
            "{}={}; Path=/; Max-Age={}",
            self.name, session_id, self.max_age_secs
        ))
    }

    /// Set-Cookie value that removes the cookie.
    pub fn build_clear(&self) -> String {
        self.with_attributes(format!(
            "{}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.name
        ))
    }

    /// Appends the session cookie to response headers.
    pub fn set(&self, headers: &mut HeaderMap, session_id: &str) {
        if let Ok(value) = HeaderValue::from_str(&self.build(session_id)) {
            headers.append(SET_COOKIE, value);
        }
    }

    /// Appends a clearing cookie to response headers.
    pub fn clear(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.build_clear()) {
            headers.append(SET_COOKIE, value);
        }
    }

    /// The session id from the request's Cookie headers, if any.
    pub fn extract<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|cookie_header| cookie_header.split(';'))
            .map(str::trim)
            .find_map(|cookie| {
                let (name, value) = cookie.split_once('=')?;
                (name == self.name && !value.is_empty()).then_some(value)
            })
    }

    fn with_attributes(&self, mut cookie: String) -> String {
        cookie.push_str("; HttpOnly; SameSite=Lax");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}
