//! Tiered degradation pipeline for a single logical generate operation.
//!
//! Four tiers, attempted strictly in order: the configured live backends
//! (each wrapped by its circuit breaker), then a cache of recent successful
//! completions, then a static degraded message. The degraded tier always
//! succeeds, so callers never see a bare failure from this component.

mod cache;

pub use cache::ResponseCache;

use crate::api::types::ChatRequest;
use crate::breaker::{BreakerError, BreakerRegistry};
use crate::config::Endpoint;
use crate::upstream::InferenceClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Which stage of the pipeline produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Live,
    Cache,
    Degraded,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Live => "live",
            Tier::Cache => "cache",
            Tier::Degraded => "degraded",
        }
    }
}

/// Outcome of one chain traversal.
#[derive(Debug, Clone)]
pub struct FallbackResult {
    pub text: String,
    pub tier: Tier,
    /// Serving endpoint name; `None` for cache and degraded tiers.
    pub endpoint: Option<String>,
    /// `false` only for the degraded tier.
    pub success: bool,
}

/// Raised only when the degraded tier itself is misconfigured. Startup
/// validation rejects an empty degraded text, so reaching this at runtime
/// signals a deployment defect rather than a recoverable condition.
#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("fallback chain exhausted: no live tier succeeded, cache missed, and no degraded text is configured")]
    ChainExhausted,
}

/// The degradation pipeline. One instance per process, shared by reference.
pub struct FallbackChain {
    tiers: Vec<Endpoint>,
    client: Arc<dyn InferenceClient>,
    breakers: Arc<BreakerRegistry>,
    cache: Arc<ResponseCache>,
    degraded_text: String,
}

impl FallbackChain {
    pub fn new(
        tiers: Vec<Endpoint>,
        client: Arc<dyn InferenceClient>,
        breakers: Arc<BreakerRegistry>,
        cache: Arc<ResponseCache>,
        degraded_text: String,
    ) -> Self {
        Self {
            tiers,
            client,
            breakers,
            cache,
            degraded_text,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Run the full pipeline: live tiers in order, then cache, then degraded.
    ///
    /// A live-tier success is written into the cache before returning so a
    /// later identical request can be served from the cache tier even with
    /// every live tier down.
    pub async fn generate(&self, request: &ChatRequest) -> Result<FallbackResult, FallbackError> {
        let fingerprint = ResponseCache::fingerprint(request);

        for endpoint in &self.tiers {
            let config = endpoint.breaker_config(self.breakers.defaults());
            let breaker = self.breakers.get_or_create_with(&endpoint.name, Some(&config));

            match breaker.call(self.client.complete(endpoint, request)).await {
                Ok(text) => {
                    self.cache.put(fingerprint, text.clone());
                    return Ok(FallbackResult {
                        text,
                        tier: Tier::Live,
                        endpoint: Some(endpoint.name.clone()),
                        success: true,
                    });
                }
                Err(BreakerError::Open { name }) => {
                    debug!(endpoint = %name, "Live tier skipped, circuit open");
                }
                Err(error) => {
                    warn!(endpoint = %endpoint.name, %error, "Live tier failed");
                }
            }
        }

        self.recover(fingerprint)
    }

    /// The cache and degraded tail of the pipeline, used directly by the
    /// dispatcher once its own live candidates are exhausted.
    pub fn recover(&self, fingerprint: u64) -> Result<FallbackResult, FallbackError> {
        if let Some(text) = self.cache.get(fingerprint) {
            debug!(fingerprint, "Serving response from cache tier");
            return Ok(FallbackResult {
                text,
                tier: Tier::Cache,
                endpoint: None,
                success: true,
            });
        }

        if self.degraded_text.is_empty() {
            error!("Degraded tier has no configured text; fallback chain exhausted");
            return Err(FallbackError::ChainExhausted);
        }

        Ok(FallbackResult {
            text: self.degraded_text.clone(),
            tier: Tier::Degraded,
            endpoint: None,
            success: false,
        })
    }
}
