//! API routes

mod auth;
mod health;
pub mod metrics;
mod profile;
mod tasks;
pub mod types;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    middleware,
};
use std::sync::Arc;
use tasklist_auth::identity_middleware;
use tower_http::cors::{Any, CorsLayer};

use crate::state::{AppState, MetricsHandle};

/// CORS policy for browser clients
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            header::AUTHORIZATION,
            HeaderName::from_static("x-csrf-token"),
        ])
}

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    // Everything here requires a bound identity
    let protected = Router::new()
        .merge(tasks::routes())
        .merge(profile::routes())
        .route_layer(middleware::from_fn_with_state(
            state.tokens(),
            identity_middleware,
        ));

    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Registration and login
        .merge(auth::routes())
        .merge(protected)
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router.layer(cors_layer())
}
