//! Custom Axum extractors.

pub mod client_meta;
pub mod user_auth;

pub use client_meta::ClientMeta;
pub use user_auth::{CurrentUser, UserAuth};
