//! HTTP-side helpers.

pub mod cookies;

pub use cookies::SessionCookie;
