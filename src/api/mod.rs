//! # HTTP API
//!
//! Inbound surface of the gateway.
//!
//! ## Endpoints
//!
//! - `POST /v1/chat/completions` - Dispatch a completion request
//! - `GET /v1/status` - Circuit breaker and health state per endpoint
//! - `GET /health` - Coarse gateway health
//! - `GET /metrics` - Prometheus text format metrics

mod completions;
mod error;
mod health;
mod status;
pub mod types;

pub use error::{ApiError, ApiErrorBody};

use crate::breaker::BreakerRegistry;
use crate::config::RelayConfig;
use crate::dispatch::Dispatcher;
use crate::fallback::{FallbackChain, ResponseCache};
use crate::health::HealthMonitor;
use crate::metrics::MetricsCollector;
use crate::upstream::{HttpUpstream, InferenceClient};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (10 MB).
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub dispatcher: Arc<Dispatcher>,
    pub breakers: Arc<BreakerRegistry>,
    pub health: Arc<HealthMonitor>,
    pub metrics_collector: Arc<MetricsCollector>,
    /// Server startup time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Wire up the full dispatch stack from configuration.
    pub fn new(config: Arc<RelayConfig>) -> Self {
        let client: Arc<dyn InferenceClient> = Arc::new(HttpUpstream::new(
            config.server.request_timeout(),
            config.health_check.probe_timeout(),
        ));
        let start_time = Instant::now();

        let breakers = Arc::new(BreakerRegistry::new(config.breaker.clone()));
        let cache = Arc::new(ResponseCache::new(config.cache.ttl()));
        let health = Arc::new(HealthMonitor::new(
            config.endpoints.clone(),
            client.clone(),
            config.health_check.clone(),
        ));

        let chain_tiers = config
            .fallback
            .tiers
            .iter()
            .filter_map(|name| config.endpoint(name).cloned())
            .collect();
        let chain = Arc::new(FallbackChain::new(
            chain_tiers,
            client.clone(),
            breakers.clone(),
            cache,
            config.fallback.degraded_text.clone(),
        ));

        let dispatcher = Arc::new(Dispatcher::new(
            config.endpoints.clone(),
            config.routing.clone(),
            client,
            breakers.clone(),
            health.clone(),
            chain,
        ));

        // Metrics are installed once per process; tests construct several
        // states, so fall back to a detached recorder handle.
        let prometheus_handle = crate::metrics::setup_metrics().unwrap_or_else(|e| {
            tracing::debug!("Metrics already initialized, creating new handle: {}", e);
            crate::metrics::PrometheusBuilder::new()
                .build_recorder()
                .handle()
        });
        let metrics_collector = Arc::new(MetricsCollector::new(
            breakers.clone(),
            health.clone(),
            start_time,
            prometheus_handle,
        ));

        Self {
            config,
            dispatcher,
            breakers,
            health,
            metrics_collector,
            start_time,
        }
    }
}

/// Create the main API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(completions::handle))
        .route("/v1/status", get(status::handle))
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .with_state(state)
}
