//! # Metrics Collection Module
//!
//! Prometheus export for the gateway's counters, histograms, and gauges.
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `relay_requests_total{endpoint, intent, status}` - Attempt outcomes
//! - `relay_errors_total{endpoint, kind}` - Errors by kind
//! - `relay_fallbacks_total{from, to}` - Candidate and tier transitions
//!
//! **Histograms:**
//! - `relay_request_duration_seconds{intent}` - End-to-end request latency
//! - `relay_classification_duration_seconds` - Classifier latency
//!
//! **Gauges:**
//! - `relay_circuit_state{endpoint}` - 0 closed, 1 half-open, 2 open
//! - `relay_endpoint_healthy{endpoint}` - 1 healthy, 0 unhealthy

pub mod handler;

// Re-export PrometheusBuilder for test compatibility
pub use metrics_exporter_prometheus::PrometheusBuilder;

use crate::breaker::BreakerRegistry;
use crate::health::HealthMonitor;
use dashmap::DashMap;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

/// Process-wide cache of sanitized label values. Endpoint names are a small,
/// fixed set, so this never grows past the configuration.
static LABEL_CACHE: LazyLock<DashMap<String, String>> = LazyLock::new(DashMap::new);

/// Get sanitized Prometheus label (cached for performance).
///
/// Prometheus label values here double as identifiers in dashboards, so they
/// are restricted to `[a-zA-Z_][a-zA-Z0-9_]*`; invalid characters become
/// underscores. Every emit site that labels by endpoint name goes through
/// this, since names like `ollama-local:11434` are valid config.
pub fn sanitize_label(label: &str) -> String {
    if let Some(cached) = LABEL_CACHE.get(label) {
        return cached.clone();
    }

    let mut sanitized = label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();

    if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }

    LABEL_CACHE.insert(label.to_string(), sanitized.clone());
    sanitized
}

/// Central coordinator for metrics rendering and state-gauge refresh.
pub struct MetricsCollector {
    breakers: Arc<BreakerRegistry>,
    health: Arc<HealthMonitor>,
    /// Gateway startup time for uptime calculation
    start_time: Instant,
    prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(
        breakers: Arc<BreakerRegistry>,
        health: Arc<HealthMonitor>,
        start_time: Instant,
        prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        Self {
            breakers,
            health,
            start_time,
            prometheus_handle,
        }
    }

    /// Refresh per-endpoint state gauges from the breaker registry and the
    /// health monitor before a scrape.
    pub fn update_state_gauges(&self) {
        for stats in self.breakers.snapshot() {
            metrics::gauge!("relay_circuit_state", "endpoint" => sanitize_label(&stats.endpoint))
                .set(stats.state.as_gauge());
        }
        for row in self.health.snapshot() {
            if let Some(healthy) = row.health.healthy {
                metrics::gauge!("relay_endpoint_healthy", "endpoint" => sanitize_label(&row.endpoint))
                    .set(if healthy { 1.0 } else { 0.0 });
            }
        }
    }

    /// Get uptime in seconds since gateway startup.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Render Prometheus metrics in text format.
    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Initialize Prometheus metrics exporter with custom histogram buckets.
///
/// Buckets are sized for LLM inference latency patterns (seconds, not
/// milliseconds) on the request histogram, and for in-memory scanning on the
/// classification histogram.
///
/// Returns a PrometheusHandle that can be used to render metrics.
pub fn setup_metrics(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

    let duration_buckets = &[
        0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0,
    ];

    let classification_buckets = &[
        0.000001, 0.00001, 0.0001, 0.001, 0.01, 0.1,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("relay_request_duration_seconds".to_string()),
            duration_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full("relay_classification_duration_seconds".to_string()),
            classification_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}
