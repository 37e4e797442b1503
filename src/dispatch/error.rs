//! Dispatch error types.

use crate::fallback::FallbackError;
use thiserror::Error;

/// Errors that escape the dispatcher.
///
/// Live-tier failures never appear here; they drive candidate progression
/// and end up as attempt metadata instead. The only escaping error is the
/// misconfigured-degraded-tier defect.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    ChainExhausted(#[from] FallbackError),
}
