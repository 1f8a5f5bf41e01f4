//! Application state

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tasklist_auth::{Authenticator, TokenService};
use tasklist_db::Database;

/// Handle used to render the Prometheus metrics endpoint
pub type MetricsHandle = PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(db: Database, auth: Arc<Authenticator>) -> Self {
        Self { db, auth }
    }

    pub fn tokens(&self) -> Arc<TokenService> {
        self.auth.tokens().clone()
    }
}
