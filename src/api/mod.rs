//! # HTTP API
//!
//! Alertmanager-compatible webhook receiver plus operational endpoints.
//!
//! ## Endpoints
//!
//! - `POST /webhook` - Alertmanager webhook notification
//! - `POST /webhook/:receiver` - Same, tagged with a receiver name
//! - `GET /health` - Liveness with rule count and uptime
//! - `GET /metrics` - Prometheus text format
//! - `GET /v1/rules` - Loaded rules with trigger status
//! - `GET /v1/rules/:namespace/:name` - A single rule
//!
//! ## Example
//!
//! ```no_run
//! use karo::api::{create_router, AppState};
//! use karo::config::KaroConfig;
//! use karo::reactor::Reactor;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(KaroConfig::default());
//! let rules = Arc::new(config.rule_store()?);
//! let reactor = Arc::new(Reactor::from_config(&config, Arc::clone(&rules))?);
//!
//! let state = Arc::new(AppState::new(config, rules, reactor));
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:9090").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

mod health;
mod rules;
pub mod types;
mod webhook;

pub use types::*;

use crate::config::KaroConfig;
use crate::metrics::MetricsCollector;
use crate::reactor::Reactor;
use crate::rules::RuleStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Maximum request body size (10 MB).
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: Arc<KaroConfig>,
    pub rules: Arc<RuleStore>,
    pub reactor: Arc<Reactor>,
    /// Server startup time for uptime tracking
    pub start_time: Instant,
    pub metrics_collector: Arc<MetricsCollector>,
}

impl AppState {
    pub fn new(config: Arc<KaroConfig>, rules: Arc<RuleStore>, reactor: Arc<Reactor>) -> Self {
        let start_time = Instant::now();

        // Reuses a detached handle when a recorder is already installed (tests).
        let prometheus_handle = crate::metrics::setup_or_reuse_metrics();
        let metrics_collector = Arc::new(MetricsCollector::new(
            Arc::clone(&rules),
            start_time,
            prometheus_handle,
        ));

        Self {
            config,
            rules,
            reactor,
            start_time,
            metrics_collector,
        }
    }
}

/// Create the main API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let timeout = state.config.server.request_timeout();

    Router::new()
        .route("/webhook", post(webhook::handle))
        .route("/webhook/:receiver", post(webhook::handle_receiver))
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .route("/v1/rules", get(rules::list))
        .route("/v1/rules/:namespace/:name", get(rules::get))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
