//! Per-endpoint circuit breakers.
//!
//! Each protected endpoint gets one named state machine that trips OPEN
//! after consecutive failures, rejects calls locally while OPEN, and
//! re-tests the endpoint through a HALF_OPEN window after a recovery
//! timeout. A name-keyed registry hands out one shared breaker per endpoint
//! regardless of caller.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Numeric encoding used for the `relay_circuit_state` gauge.
    pub fn as_gauge(&self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 1.0,
            CircuitState::Open => 2.0,
        }
    }
}

/// Circuit breaker thresholds and timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before CLOSED trips to OPEN.
    pub failure_threshold: u32,
    /// Consecutive HALF_OPEN successes before the breaker closes again.
    pub success_threshold: u32,
    /// Seconds an OPEN breaker waits before allowing a HALF_OPEN probe call.
    pub recovery_timeout_seconds: u64,
    /// Per-call deadline; an elapsed deadline counts as a failure.
    pub timeout_seconds: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            success_threshold: 2,
            recovery_timeout_seconds: 30,
            timeout_seconds: 5,
        }
    }
}

impl BreakerConfig {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_seconds)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Error returned by [`CircuitBreaker::call`].
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// Rejected locally without invoking the wrapped call.
    #[error("circuit '{name}' is open")]
    Open { name: String },
    /// The wrapped call exceeded the per-call deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    /// The wrapped call itself failed.
    #[error("{0}")]
    Inner(E),
}

/// Read-only statistics snapshot for the status surface.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStats {
    pub endpoint: String,
    pub state: CircuitState,
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub rejections: u64,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
}

/// Mutable breaker state, guarded by one per-instance lock so traffic to a
/// healthy endpoint is never serialized behind a failing one.
#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    last_failure: Option<Instant>,
    requests: u64,
    successes: u64,
    failures: u64,
    timeouts: u64,
    rejections: u64,
}

impl BreakerInner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_failure: None,
            requests: 0,
            successes: 0,
            failures: 0,
            timeouts: 0,
            rejections: 0,
        }
    }
}

/// A named circuit breaker protecting one call target.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        let name = name.into();
        metrics::gauge!("relay_circuit_state", "endpoint" => crate::metrics::sanitize_label(&name))
            .set(CircuitState::Closed.as_gauge());
        Self {
            name,
            config,
            inner: Mutex::new(BreakerInner::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke `fut` under this breaker's protection.
    ///
    /// While OPEN and inside the recovery window every call is rejected with
    /// [`BreakerError::Open`] without invoking the future; once the window
    /// has elapsed the breaker moves to HALF_OPEN and lets the call through.
    /// The future runs under the configured per-call timeout; an elapsed
    /// timeout counts as a failure.
    pub async fn call<F, T, E>(&self, fut: F) -> Result<T, BreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.admit()?;

        match tokio::time::timeout(self.config.call_timeout(), fut).await {
            Ok(Ok(value)) => {
                self.record_success();
                Ok(value)
            }
            Ok(Err(error)) => {
                self.record_failure(false);
                Err(BreakerError::Inner(error))
            }
            Err(_) => {
                self.record_failure(true);
                Err(BreakerError::Timeout(self.config.call_timeout()))
            }
        }
    }

    /// Admission check: reject while OPEN, transition to HALF_OPEN once the
    /// recovery window has elapsed since the last failure.
    fn admit<E>(&self) -> Result<(), BreakerError<E>> {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        if inner.state == CircuitState::Open {
            let elapsed = inner
                .last_failure
                .map(|t| t.elapsed() >= self.config.recovery_timeout())
                .unwrap_or(true);
            if elapsed {
                self.transition(&mut inner, CircuitState::HalfOpen);
                inner.consecutive_failures = 0;
                inner.consecutive_successes = 0;
            } else {
                inner.rejections += 1;
                return Err(BreakerError::Open {
                    name: self.name.clone(),
                });
            }
        }
        inner.requests += 1;
        Ok(())
    }

    fn record_success(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.successes += 1;
        inner.consecutive_failures = 0;
        inner.consecutive_successes += 1;

        if inner.state == CircuitState::HalfOpen
            && inner.consecutive_successes >= self.config.success_threshold
        {
            self.transition(&mut inner, CircuitState::Closed);
            inner.consecutive_successes = 0;
            inner.consecutive_failures = 0;
        }
    }

    fn record_failure(&self, timed_out: bool) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.failures += 1;
        if timed_out {
            inner.timeouts += 1;
        }
        inner.consecutive_successes = 0;
        inner.consecutive_failures += 1;
        inner.last_failure = Some(Instant::now());

        match inner.state {
            // Any single HALF_OPEN failure reopens immediately.
            CircuitState::HalfOpen => self.transition(&mut inner, CircuitState::Open),
            CircuitState::Closed
                if inner.consecutive_failures >= self.config.failure_threshold =>
            {
                self.transition(&mut inner, CircuitState::Open)
            }
            _ => {}
        }
    }

    fn transition(&self, inner: &mut BreakerInner, next: CircuitState) {
        if inner.state != next {
            tracing::info!(
                endpoint = %self.name,
                from = ?inner.state,
                to = ?next,
                "Circuit breaker state changed"
            );
            inner.state = next;
            metrics::gauge!("relay_circuit_state", "endpoint" => crate::metrics::sanitize_label(&self.name))
                .set(next.as_gauge());
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("breaker lock poisoned").state
    }

    pub fn stats(&self) -> BreakerStats {
        let inner = self.inner.lock().expect("breaker lock poisoned");
        BreakerStats {
            endpoint: self.name.clone(),
            state: inner.state,
            requests: inner.requests,
            successes: inner.successes,
            failures: inner.failures,
            timeouts: inner.timeouts,
            rejections: inner.rejections,
            consecutive_failures: inner.consecutive_failures,
            consecutive_successes: inner.consecutive_successes,
        }
    }
}

/// Name-keyed registry handing out one breaker per endpoint.
///
/// Constructed once at process start and injected by reference into the
/// dispatcher and the fallback chain so both wrap the same named endpoint
/// with the same breaker.
pub struct BreakerRegistry {
    defaults: BreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(defaults: BreakerConfig) -> Self {
        Self {
            defaults,
            breakers: DashMap::new(),
        }
    }

    /// Global defaults breakers are created with absent an override.
    pub fn defaults(&self) -> &BreakerConfig {
        &self.defaults
    }

    /// Get the breaker for `name`, creating it with the registry defaults on
    /// first use. Idempotent.
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        self.get_or_create_with(name, None)
    }

    /// Get the breaker for `name`, honoring a per-endpoint config override
    /// when the breaker is first created.
    pub fn get_or_create_with(
        &self,
        name: &str,
        override_config: Option<&BreakerConfig>,
    ) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                let config = override_config.cloned().unwrap_or_else(|| self.defaults.clone());
                Arc::new(CircuitBreaker::new(name, config))
            })
            .clone()
    }

    /// Statistics for every breaker created so far, sorted by endpoint name
    /// for a stable status surface.
    pub fn snapshot(&self) -> Vec<BreakerStats> {
        let mut stats: Vec<BreakerStats> =
            self.breakers.iter().map(|entry| entry.value().stats()).collect();
        stats.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        stats
    }
}
