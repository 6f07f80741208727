//! Shared utilities and common types for the Fleet Maintenance backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Opaque session identifier generation and hashing
//! - Offset pagination parameters and pages
//! - Access token verification
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod validation;
