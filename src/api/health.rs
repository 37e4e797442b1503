//! Gateway health handler.

use super::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    endpoints_total: usize,
    endpoints_healthy: usize,
    endpoints_unhealthy: usize,
    uptime_seconds: u64,
}

/// Handler for GET /health.
///
/// Coarse gateway status: `healthy` when no endpoint is marked unhealthy,
/// `degraded` when some are, `unhealthy` when every known endpoint is down.
/// Never-probed endpoints count as healthy, matching the routing policy.
pub async fn handle(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.health.snapshot();
    let total = snapshot.len();
    let unhealthy = snapshot
        .iter()
        .filter(|row| row.health.healthy == Some(false))
        .count();
    let healthy = total - unhealthy;

    let status = if unhealthy == 0 {
        "healthy"
    } else if healthy > 0 {
        "degraded"
    } else {
        "unhealthy"
    };

    Json(HealthResponse {
        status,
        endpoints_total: total,
        endpoints_healthy: healthy,
        endpoints_unhealthy: unhealthy,
        uptime_seconds: state.metrics_collector.uptime_seconds(),
    })
}
