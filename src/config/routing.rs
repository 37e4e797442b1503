//! Request routing configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_max_retries() -> u32 {
    1
}

fn default_backoff_base_ms() -> u64 {
    100
}

fn default_backoff_max_ms() -> u64 {
    2000
}

/// Routing policy: intent to primary endpoint, plus the ordered fallback
/// list per primary and the per-endpoint retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Intent label ("code", "reasoning", "general") to primary endpoint
    /// name. A "general" entry is required; unmapped intents fall back to it.
    pub intents: HashMap<String, String>,
    /// Primary endpoint name to ordered fallback endpoint names.
    pub fallbacks: HashMap<String, Vec<String>>,
    /// Extra attempts per endpoint after the first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Exponential backoff base delay between retries, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Backoff delay ceiling in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            intents: HashMap::new(),
            fallbacks: HashMap::new(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl RoutingConfig {
    /// Primary endpoint for an intent, falling back to the "general" mapping.
    pub fn primary_for(&self, intent: &str) -> Option<&str> {
        self.intents
            .get(intent)
            .or_else(|| self.intents.get("general"))
            .map(String::as_str)
    }

    /// Ordered fallback endpoints for a primary; empty when none configured.
    pub fn fallbacks_for(&self, primary: &str) -> &[String] {
        self.fallbacks
            .get(primary)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RoutingConfig {
        toml::from_str(
            r#"
            max_retries = 2

            [intents]
            code = "coder"
            general = "chat"

            [fallbacks]
            coder = ["chat", "cloud"]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_routing_config_defaults() {
        let config = RoutingConfig::default();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.backoff_base_ms, 100);
        assert_eq!(config.backoff_max_ms, 2000);
        assert!(config.intents.is_empty());
    }

    #[test]
    fn test_primary_lookup() {
        let config = sample();
        assert_eq!(config.primary_for("code"), Some("coder"));
        assert_eq!(config.primary_for("general"), Some("chat"));
    }

    #[test]
    fn test_unmapped_intent_falls_back_to_general() {
        let config = sample();
        assert_eq!(config.primary_for("reasoning"), Some("chat"));
    }

    #[test]
    fn test_fallback_lookup() {
        let config = sample();
        assert_eq!(config.fallbacks_for("coder"), &["chat", "cloud"]);
        assert!(config.fallbacks_for("chat").is_empty());
    }
}
