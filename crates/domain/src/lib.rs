//! Domain layer for the fleet maintenance backend.
//!
//! This crate contains:
//! - The permission model and resolver
//! - Audit, activity and login session models
//! - The diff engine, activity recorder and session tracker
//! - Storage traits the core depends on, with in-memory implementations

pub mod models;
pub mod services;
