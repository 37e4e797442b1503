//! Error types for outbound backend calls.

use thiserror::Error;

/// Errors from a live backend call or readiness probe.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Network connectivity error (DNS, connection refused, reset, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The backend returned a non-success HTTP status.
    #[error("backend error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The backend response doesn't match the expected completion shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Classify a reqwest error. Timeouts on probe calls surface as network
    /// errors here; completion-call deadlines are enforced by the circuit
    /// breaker and never reach this path.
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        UpstreamError::Network(error.to_string())
    }

    /// Metric label for `relay_errors_total{kind}`.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Network(_) => "network",
            UpstreamError::Upstream { .. } => "upstream",
            UpstreamError::InvalidResponse(_) => "invalid_response",
        }
    }
}
