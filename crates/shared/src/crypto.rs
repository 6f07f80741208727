//! Cryptographic utilities for session identifier generation and hashing.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Prefix carried by every browsing-session identifier.
pub const SESSION_ID_PREFIX: &str = "sess_";

/// Number of random bytes behind a session identifier.
const SESSION_ID_BYTES: usize = 16;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a new opaque session identifier (`sess_` + 32 lowercase hex chars).
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", SESSION_ID_PREFIX, hex::encode(bytes))
}

/// Checks whether a string has the shape of a session identifier.
///
/// Only the shape is checked; whether the session is still open is up to the registry.
pub fn is_session_id(candidate: &str) -> bool {
    match candidate.strip_prefix(SESSION_ID_PREFIX) {
        Some(rest) => {
            rest.len() == SESSION_ID_BYTES * 2
                && rest
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        }
        None => false,
    }
}
