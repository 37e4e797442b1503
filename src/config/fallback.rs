//! Fallback chain and cache configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_degraded_text() -> String {
    "All inference backends are temporarily unavailable. Please try again shortly.".to_string()
}

/// Fallback chain settings: the ordered live tiers and the degraded message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Ordered live-tier endpoint names for the standalone chain.
    pub tiers: Vec<String>,
    /// Text served by the guaranteed-success degraded tier.
    pub degraded_text: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            tiers: Vec::new(),
            degraded_text: default_degraded_text(),
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 3600 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}
