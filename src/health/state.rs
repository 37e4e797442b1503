//! Per-endpoint health state tracking.

use super::HealthCheckConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health record for one endpoint.
///
/// `healthy` starts as `None` (never probed); routing treats unknown as
/// routable so a cold start never filters every candidate out. The first
/// completed probe decides the status immediately; after that, flips require
/// the configured consecutive-count thresholds.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointHealth {
    pub healthy: Option<bool>,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub last_probe: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl EndpointHealth {
    pub fn new() -> Self {
        Self {
            healthy: None,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_probe: None,
            last_error: None,
        }
    }

    /// Record one probe result. Returns `Some(new_status)` when the recorded
    /// status flipped, `None` otherwise.
    pub fn apply_probe(
        &mut self,
        success: bool,
        error: Option<String>,
        config: &HealthCheckConfig,
    ) -> Option<bool> {
        self.last_probe = Some(Utc::now());
        if success {
            self.consecutive_successes += 1;
            self.consecutive_failures = 0;
            self.last_error = None;
        } else {
            self.consecutive_failures += 1;
            self.consecutive_successes = 0;
            self.last_error = error;
        }

        let next = match self.healthy {
            None => Some(success),
            Some(true) if !success && self.consecutive_failures >= config.failure_threshold => {
                Some(false)
            }
            Some(false) if success && self.consecutive_successes >= config.recovery_threshold => {
                Some(true)
            }
            current => current,
        };

        if next != self.healthy {
            self.healthy = next;
            next
        } else {
            None
        }
    }
}

impl Default for EndpointHealth {
    fn default() -> Self {
        Self::new()
    }
}
