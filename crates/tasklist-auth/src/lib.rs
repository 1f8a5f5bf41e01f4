//! Tasklist Authentication
//!
//! This crate provides Argon2 credential hashing, HS256 identity tokens,
//! and the axum middleware that binds a verified identity to each
//! protected request.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use error::AuthError;
pub use jwt::{Claims, Clock, SystemClock, TokenService};
pub use middleware::{AuthUser, extract_bearer_token, identity_middleware};
pub use password::CredentialManager;
pub use service::{Authenticator, CredentialStore, Session, StoredCredential};
