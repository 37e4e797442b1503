//! Read-only status handler.

use super::AppState;
use crate::breaker::BreakerStats;
use crate::health::HealthSnapshot;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct StatusResponse {
    uptime_seconds: u64,
    endpoints: Vec<EndpointStatus>,
    circuit_breakers: Vec<BreakerStats>,
    health: Vec<HealthSnapshot>,
}

/// Configured identity of one endpoint, as loaded at startup.
#[derive(Debug, Serialize)]
struct EndpointStatus {
    name: String,
    url: String,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    capability: Option<String>,
}

/// Handler for GET /v1/status.
///
/// Reports the configured endpoints plus current circuit state and health
/// per endpoint, sorted by endpoint name. Breakers are created lazily, so an
/// endpoint that has never been dispatched to will not appear under
/// `circuit_breakers` yet.
pub async fn handle(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut endpoints: Vec<EndpointStatus> = state
        .config
        .endpoints
        .iter()
        .map(|endpoint| EndpointStatus {
            name: endpoint.name.clone(),
            url: endpoint.url.clone(),
            model: endpoint.model.clone(),
            capability: endpoint.capability.clone(),
        })
        .collect();
    endpoints.sort_by(|a, b| a.name.cmp(&b.name));

    Json(StatusResponse {
        uptime_seconds: state.metrics_collector.uptime_seconds(),
        endpoints,
        circuit_breakers: state.breakers.snapshot(),
        health: state.health.snapshot(),
    })
}
