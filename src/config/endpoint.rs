//! Endpoint configuration.

use crate::breaker::BreakerConfig;
use serde::{Deserialize, Serialize};

fn default_probe_path() -> String {
    "/health".to_string()
}

/// One configured inference backend.
///
/// Immutable after load; owned by configuration and referenced by name
/// everywhere else (breaker registry, health records, routing tables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    /// Unique endpoint name, used as the key for breakers and health records.
    pub name: String,
    /// Base address, e.g. `http://localhost:11434`.
    pub url: String,
    /// Model identifier sent on completion calls.
    pub model: String,
    /// Static capability tag ("code", "reasoning", "general", ...), reported
    /// on the status surface for operators. Routing is driven by the
    /// `[routing]` tables, not by this tag.
    #[serde(default)]
    pub capability: Option<String>,
    /// Per-call timeout override in seconds; defaults to the global breaker
    /// timeout when unset.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Default generation parameters applied when the request omits them.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Readiness probe path.
    #[serde(default = "default_probe_path")]
    pub probe_path: String,
    /// Optional per-endpoint circuit breaker override.
    #[serde(default)]
    pub breaker: Option<BreakerConfig>,
}

impl Endpoint {
    /// Effective breaker config for this endpoint: the per-endpoint override
    /// when present, otherwise the global defaults, with the endpoint's
    /// per-call timeout applied on top.
    pub fn breaker_config(&self, defaults: &BreakerConfig) -> BreakerConfig {
        let mut config = self.breaker.clone().unwrap_or_else(|| defaults.clone());
        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }
        config
    }
}
