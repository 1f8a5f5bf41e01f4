//! Identity token issuance and verification
//!
//! Tokens are HS256 JWTs carrying `sub` (the user id), `iat` and `exp`.
//! They are never stored server side; a token is valid until its `exp`
//! passes and there is no way to revoke it earlier.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;

/// Source of the current time for issuing and expiring tokens
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Claims as found in an untrusted token, before presence checks
#[derive(Debug, Deserialize)]
struct PresentedClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    exp: Option<i64>,
}

/// Issues and verifies identity tokens with a process-wide secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    has_secret: bool,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a token service using the system clock
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self::with_clock(secret, ttl, Arc::new(SystemClock))
    }

    /// Create a token service with an explicit time source
    pub fn with_clock(secret: &str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `clock` after the signature, not by the library
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            has_secret: !secret.is_empty(),
            ttl,
            clock,
        }
    }

    /// Token lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issue a signed token for a user
    pub fn issue(&self, user_id: i64) -> Result<String, AuthError> {
        if !self.has_secret {
            return Err(AuthError::Signing("signing secret is empty".to_string()));
        }

        let now = self.clock.now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        debug!("Issuing token for user {}", user_id);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify a token and return the user id it is bound to
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        // Nothing can carry a valid signature without a secret
        if !self.has_secret {
            return Err(AuthError::InvalidSignature);
        }

        let claims = decode::<PresentedClaims>(token, &self.decoding_key, &self.validation)
            .map_err(classify)?
            .claims;

        let (Some(exp), Some(_iat)) = (claims.exp, claims.iat) else {
            return Err(AuthError::MalformedToken);
        };

        if self.clock.now().timestamp() > exp {
            return Err(AuthError::TokenExpired);
        }

        claims
            .sub
            .as_deref()
            .and_then(|sub| sub.parse::<i64>().ok())
            .ok_or(AuthError::MissingIdentity)
    }
}

/// Map a decoding failure onto the token error taxonomy
fn classify(error: jsonwebtoken::errors::Error) -> AuthError {
    match error.kind() {
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::MissingRequiredClaim(_) | ErrorKind::InvalidSubject => {
            AuthError::MissingIdentity
        }
        _ => AuthError::MalformedToken,
    }
}
