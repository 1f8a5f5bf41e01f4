//! Password hashing with Argon2id

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::error::AuthError;

/// Default Argon2 time cost (iterations)
pub const DEFAULT_TIME_COST: u32 = 2;
/// Default Argon2 memory cost in KiB
pub const DEFAULT_MEMORY_KIB: u32 = 19_456;

const PARALLELISM: u32 = 1;
const SALT_LEN: usize = 16;

/// Hashes and verifies user passwords.
///
/// The cost parameters only affect new hashes; verification always uses the
/// parameters recorded in the stored credential.
#[derive(Debug, Clone)]
pub struct CredentialManager {
    time_cost: u32,
    memory_kib: u32,
}

impl Default for CredentialManager {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_COST, DEFAULT_MEMORY_KIB)
    }
}

impl CredentialManager {
    pub fn new(time_cost: u32, memory_kib: u32) -> Self {
        Self {
            time_cost,
            memory_kib,
        }
    }

    fn hasher(&self) -> Result<Argon2<'static>, AuthError> {
        let params = Params::new(self.memory_kib, self.time_cost, PARALLELISM, None)
            .map_err(|e| AuthError::Hashing(format!("invalid cost parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn salt() -> Result<SaltString, AuthError> {
        let mut bytes = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::Hashing(format!("randomness source unavailable: {}", e)))?;
        SaltString::encode_b64(&bytes).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Hash a password into a PHC string
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        if plaintext.is_empty() {
            return Err(AuthError::Hashing("password must not be empty".to_string()));
        }

        let hasher = self.hasher()?;
        let salt = Self::salt()?;

        hasher
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Check a password against a stored credential.
    ///
    /// Malformed credentials never match.
    pub fn verify(&self, plaintext: &str, credential: &str) -> bool {
        PasswordHash::new(credential)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(plaintext.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// [`hash`](Self::hash) on the blocking thread pool
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, AuthError> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Hashing(format!("hashing task failed: {}", e)))?
    }

    /// [`verify`](Self::verify) on the blocking thread pool
    pub async fn verify_blocking(&self, plaintext: String, credential: String) -> bool {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.verify(&plaintext, &credential))
            .await
            .unwrap_or(false)
    }
}
