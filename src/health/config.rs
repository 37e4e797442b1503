//! Health check configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Background health monitoring settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Master switch for the background probe loop.
    pub enabled: bool,
    /// Seconds between probe rounds.
    pub interval_seconds: u64,
    /// Per-probe timeout in seconds.
    pub timeout_seconds: u64,
    /// Consecutive probe failures before an endpoint is marked unhealthy.
    pub failure_threshold: u32,
    /// Consecutive probe successes before an unhealthy endpoint recovers.
    pub recovery_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 30,
            timeout_seconds: 5,
            failure_threshold: 3,
            recovery_threshold: 2,
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
