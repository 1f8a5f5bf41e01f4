//! Tasklist REST API
//!
//! This crate provides the Axum-based HTTP API: registration and login,
//! the per-user task endpoints, and the profile endpoint.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
