//! Access token verification.
//!
//! Tokens are issued by the external authentication service. This module only
//! checks signature and expiry and hands back the subject. RS256 is the
//! production algorithm; HS256 is accepted for shared-secret deployments and tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// JWT token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

impl Claims {
    /// Parse the subject as a user ID.
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidToken)
    }
}

/// Signature algorithm accepted by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    Rs256,
    Hs256,
}

impl FromStr for SigningAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RS256" => Ok(SigningAlgorithm::Rs256),
            "HS256" => Ok(SigningAlgorithm::Hs256),
            other => Err(JwtError::InvalidKey(format!(
                "Unsupported algorithm: {}",
                other
            ))),
        }
    }
}

impl From<SigningAlgorithm> for Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::Rs256 => Algorithm::RS256,
            SigningAlgorithm::Hs256 => Algorithm::HS256,
        }
    }
}

/// Verifies bearer tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    algorithm: SigningAlgorithm,
    leeway_secs: u64,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

impl TokenVerifier {
    /// Creates a verifier from an RSA public key in PEM format.
    pub fn rs256(public_key_pem: &str, leeway_secs: u64) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            decoding_key,
            algorithm: SigningAlgorithm::Rs256,
            leeway_secs,
        })
    }

    /// Creates a verifier for HS256 tokens signed with a shared secret.
    pub fn hs256(secret: &str, leeway_secs: u64) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: SigningAlgorithm::Hs256,
            leeway_secs,
        }
    }

    /// Validates a token and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm.into());
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validates a token and returns the subject user ID.
    pub fn verify_user_id(&self, token: &str) -> Result<Uuid, JwtError> {
        self.verify(token)?.user_id()
    }
}

/// Signs HS256 tokens. Used by shared-secret deployments and test harnesses.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    expiry_secs: i64,
}

impl TokenSigner {
    /// Create a signer with the given shared secret and token lifetime.
    pub fn hs256(secret: &str, expiry_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            expiry_secs,
        }
    }

    /// Sign an access token for the given user.
    pub fn sign(&self, user_id: Uuid) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + Duration::seconds(self.expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }
}
