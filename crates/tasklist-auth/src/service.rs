//! Login orchestration over an injected credential store

use async_trait::async_trait;
use std::sync::Arc;
use tasklist_db::Database;
use tracing::{debug, info};

use crate::error::AuthError;
use crate::jwt::TokenService;
use crate::password::CredentialManager;

/// Verified against when the username is unknown, so that lookups of
/// missing users cost as much as a wrong password.
const TIMING_PLACEHOLDER: &str = "tasklist-timing-placeholder";

/// A user's stored credential
#[derive(Debug, Clone)]
pub struct StoredCredential {
    pub user_id: i64,
    pub password_hash: String,
}

/// Lookup of stored credentials by username
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn credential_for(&self, username: &str) -> Result<Option<StoredCredential>, AuthError>;
}

#[async_trait]
impl CredentialStore for Database {
    async fn credential_for(&self, username: &str) -> Result<Option<StoredCredential>, AuthError> {
        let user = self
            .get_user_by_username(username)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(user.map(|u| StoredCredential {
            user_id: u.id,
            password_hash: u.password_hash,
        }))
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub token: String,
    pub expires_in: i64,
}

/// Ties the credential manager, token service and credential store together
#[derive(Clone)]
pub struct Authenticator {
    credentials: CredentialManager,
    tokens: Arc<TokenService>,
    store: Arc<dyn CredentialStore>,
    placeholder_credential: String,
}

impl Authenticator {
    /// Create an authenticator.
    ///
    /// Hashes a placeholder credential with the configured cost, so invalid
    /// cost parameters are reported here instead of on first registration.
    pub async fn new(
        credentials: CredentialManager,
        tokens: Arc<TokenService>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, AuthError> {
        let placeholder_credential = credentials
            .hash_blocking(TIMING_PLACEHOLDER.to_string())
            .await?;

        Ok(Self {
            credentials,
            tokens,
            store,
            placeholder_credential,
        })
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Hash a new user's password for persistence
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        self.credentials.hash_blocking(password.to_string()).await
    }

    /// Check a username and password and issue a token
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        debug!("Login attempt for user: {}", username);

        let credential = self.store.credential_for(username).await?;

        let hash_to_verify = credential
            .as_ref()
            .map(|c| c.password_hash.clone())
            .unwrap_or_else(|| self.placeholder_credential.clone());

        let password_valid = self
            .credentials
            .verify_blocking(password.to_string(), hash_to_verify)
            .await;

        let user_id = match (credential, password_valid) {
            (Some(c), true) => c.user_id,
            _ => {
                metrics::counter!("tasklist_logins_total", "outcome" => "rejected").increment(1);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(user_id)?;

        metrics::counter!("tasklist_logins_total", "outcome" => "success").increment(1);
        info!("User {} logged in successfully", username);

        Ok(Session {
            user_id,
            token,
            expires_in: self.tokens.ttl_seconds(),
        })
    }
}
