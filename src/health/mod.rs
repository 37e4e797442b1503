//! Background endpoint health monitoring.
//!
//! A single monitor owns one health record per configured endpoint and
//! refreshes all of them concurrently on a fixed interval. Routing consults
//! the records through [`HealthMonitor::is_healthy`]; the probe loop runs on
//! its own task and is stopped through a cancellation token at shutdown.

mod config;
mod state;

pub use config::HealthCheckConfig;
pub use state::EndpointHealth;

use crate::config::Endpoint;
use crate::upstream::InferenceClient;
use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One row of the health status surface.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub endpoint: String,
    #[serde(flatten)]
    pub health: EndpointHealth,
}

/// Tracks reachability of every configured endpoint.
pub struct HealthMonitor {
    endpoints: Vec<Endpoint>,
    client: Arc<dyn InferenceClient>,
    config: HealthCheckConfig,
    records: DashMap<String, EndpointHealth>,
}

impl HealthMonitor {
    pub fn new(
        endpoints: Vec<Endpoint>,
        client: Arc<dyn InferenceClient>,
        config: HealthCheckConfig,
    ) -> Self {
        let records = DashMap::new();
        for endpoint in &endpoints {
            records.insert(endpoint.name.clone(), EndpointHealth::new());
        }
        Self {
            endpoints,
            client,
            config,
            records,
        }
    }

    /// Whether routing may send traffic to `name`.
    ///
    /// Unknown and never-probed endpoints are routable; only an endpoint
    /// explicitly marked unhealthy is filtered out.
    pub fn is_healthy(&self, name: &str) -> bool {
        self.records
            .get(name)
            .map(|record| record.healthy.unwrap_or(true))
            .unwrap_or(true)
    }

    /// Current health of every endpoint, sorted by name.
    pub fn snapshot(&self) -> Vec<HealthSnapshot> {
        let mut rows: Vec<HealthSnapshot> = self
            .records
            .iter()
            .map(|entry| HealthSnapshot {
                endpoint: entry.key().clone(),
                health: entry.value().clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        rows
    }

    /// Probe every endpoint once, concurrently, and fold the results into
    /// the health records.
    pub async fn probe_all(&self) {
        let probes = self.endpoints.iter().map(|endpoint| async move {
            let result = self.client.probe(endpoint).await;
            (endpoint.name.clone(), result)
        });

        for (name, result) in join_all(probes).await {
            let (success, error) = match result {
                Ok(()) => (true, None),
                Err(e) => (false, Some(e.to_string())),
            };

            let mut record = self
                .records
                .entry(name.clone())
                .or_insert_with(EndpointHealth::new);
            let flipped = record.apply_probe(success, error.clone(), &self.config);
            drop(record);

            match flipped {
                Some(true) => {
                    info!(endpoint = %name, "Endpoint is healthy");
                    metrics::gauge!("relay_endpoint_healthy", "endpoint" => crate::metrics::sanitize_label(&name))
                        .set(1.0);
                }
                Some(false) => {
                    warn!(
                        endpoint = %name,
                        error = error.as_deref().unwrap_or("unknown"),
                        "Endpoint marked unhealthy"
                    );
                    metrics::gauge!("relay_endpoint_healthy", "endpoint" => crate::metrics::sanitize_label(&name))
                        .set(0.0);
                }
                None => {
                    debug!(endpoint = %name, success, "Health probe completed");
                }
            }
        }
    }

    /// Spawn the periodic probe loop.
    ///
    /// Runs one round immediately, then every `interval_seconds`. A tick that
    /// lands while a slow round is still in flight is skipped rather than
    /// queued. The task exits promptly when `shutdown` is cancelled.
    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                interval_seconds = self.config.interval_seconds,
                endpoints = self.endpoints.len(),
                "Health monitor started"
            );

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Health monitor stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        self.probe_all().await;
                    }
                }
            }
        })
    }
}
