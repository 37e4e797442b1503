//! Request dispatch.
//!
//! The dispatcher composes the classifier, breaker registry, health monitor,
//! and fallback chain into one routing decision per request: classify the
//! intent, build the candidate endpoint order from the routing policy
//! filtered by health, attempt candidates sequentially through their
//! breakers with bounded retries, and degrade through the cache and static
//! tiers when every live candidate is exhausted.

mod backoff;
mod error;

pub use backoff::Backoff;
pub use error::DispatchError;

use crate::api::types::ChatRequest;
use crate::breaker::{BreakerError, BreakerRegistry, CircuitBreaker};
use crate::classifier::{classify, Intent};
use crate::config::{Endpoint, RoutingConfig};
use crate::fallback::{FallbackChain, ResponseCache, Tier};
use crate::health::HealthMonitor;
use crate::metrics::sanitize_label;
use crate::upstream::InferenceClient;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How one attempt against one endpoint ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    Failed,
    TimedOut,
    /// Skipped locally because the endpoint's breaker is open; no network
    /// call was made.
    Rejected,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Succeeded => "succeeded",
            AttemptOutcome::Failed => "failed",
            AttemptOutcome::TimedOut => "timed_out",
            AttemptOutcome::Rejected => "rejected",
        }
    }
}

/// One attempt record.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub endpoint: String,
    pub outcome: AttemptOutcome,
}

/// Full routing metadata for one request, returned to the caller and fed to
/// the metrics surface. Not persisted beyond the request.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDecision {
    /// Serving endpoint name; `None` when no live endpoint served the
    /// request.
    pub model_id: Option<String>,
    pub intent: Intent,
    pub confidence: f32,
    pub attempts: Vec<Attempt>,
    pub endpoints_tried: Vec<String>,
    pub fallback_used: bool,
    /// Absent when served live; `cache` or `degraded` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_used: Option<Tier>,
    pub total_latency_seconds: f64,
}

/// Dispatch result: the response text plus its decision metadata.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub text: String,
    /// `false` only when the degraded tier served the request.
    pub success: bool,
    pub decision: RoutingDecision,
}

/// The composing orchestrator. One instance per process; all collaborators
/// are injected and shared by reference.
pub struct Dispatcher {
    endpoints: HashMap<String, Endpoint>,
    routing: RoutingConfig,
    client: Arc<dyn InferenceClient>,
    breakers: Arc<BreakerRegistry>,
    health: Arc<HealthMonitor>,
    chain: Arc<FallbackChain>,
    backoff: Backoff,
}

impl Dispatcher {
    pub fn new(
        endpoints: Vec<Endpoint>,
        routing: RoutingConfig,
        client: Arc<dyn InferenceClient>,
        breakers: Arc<BreakerRegistry>,
        health: Arc<HealthMonitor>,
        chain: Arc<FallbackChain>,
    ) -> Self {
        let backoff = Backoff::new(routing.backoff_base_ms, routing.backoff_max_ms);
        Self {
            endpoints: endpoints
                .into_iter()
                .map(|e| (e.name.clone(), e))
                .collect(),
            routing,
            client,
            breakers,
            health,
            chain,
            backoff,
        }
    }

    /// Route one request to exactly one winning result.
    ///
    /// Never fails for backend reasons; the only error is the
    /// misconfigured-degraded-tier defect rejected at startup validation.
    pub async fn dispatch(&self, request: &ChatRequest) -> Result<DispatchOutcome, DispatchError> {
        let start = Instant::now();

        let classify_start = Instant::now();
        let classification = classify(&request.prompt_text());
        metrics::histogram!("relay_classification_duration_seconds")
            .record(classify_start.elapsed().as_secs_f64());
        debug!(
            intent = %classification.intent,
            confidence = classification.confidence,
            "Request classified"
        );

        let candidates = self.candidate_order(classification.intent);
        let primary = candidates.first().map(|e| e.name.clone());
        let fingerprint = ResponseCache::fingerprint(request);

        let mut attempts: Vec<Attempt> = Vec::new();
        let mut endpoints_tried: Vec<String> = Vec::new();

        for (index, endpoint) in candidates.iter().enumerate() {
            if index > 0 {
                metrics::counter!(
                    "relay_fallbacks_total",
                    "from" => sanitize_label(&candidates[index - 1].name),
                    "to" => sanitize_label(&endpoint.name)
                )
                .increment(1);
            }
            endpoints_tried.push(endpoint.name.clone());
            let breaker = self.breaker_for(endpoint);

            'retries: for retry in 0..=self.routing.max_retries {
                if retry > 0 {
                    tokio::time::sleep(self.backoff.delay(retry - 1)).await;
                }

                match breaker.call(self.client.complete(endpoint, request)).await {
                    Ok(text) => {
                        attempts.push(Attempt {
                            endpoint: endpoint.name.clone(),
                            outcome: AttemptOutcome::Succeeded,
                        });
                        self.record_attempt(&endpoint.name, classification.intent, AttemptOutcome::Succeeded);
                        self.chain.cache().put(fingerprint, text.clone());

                        let fallback_used = primary.as_deref() != Some(endpoint.name.as_str());
                        let decision = RoutingDecision {
                            model_id: Some(endpoint.name.clone()),
                            intent: classification.intent,
                            confidence: classification.confidence,
                            attempts,
                            endpoints_tried,
                            fallback_used,
                            tier_used: None,
                            total_latency_seconds: start.elapsed().as_secs_f64(),
                        };
                        self.record_latency(&decision);
                        return Ok(DispatchOutcome {
                            text,
                            success: true,
                            decision,
                        });
                    }
                    Err(BreakerError::Open { .. }) => {
                        // Rejected locally; further retries against this
                        // endpoint would be rejected too.
                        attempts.push(Attempt {
                            endpoint: endpoint.name.clone(),
                            outcome: AttemptOutcome::Rejected,
                        });
                        self.record_attempt(&endpoint.name, classification.intent, AttemptOutcome::Rejected);
                        debug!(endpoint = %endpoint.name, "Candidate skipped, circuit open");
                        break 'retries;
                    }
                    Err(BreakerError::Timeout(deadline)) => {
                        attempts.push(Attempt {
                            endpoint: endpoint.name.clone(),
                            outcome: AttemptOutcome::TimedOut,
                        });
                        self.record_attempt(&endpoint.name, classification.intent, AttemptOutcome::TimedOut);
                        metrics::counter!(
                            "relay_errors_total",
                            "endpoint" => sanitize_label(&endpoint.name),
                            "kind" => "timeout"
                        )
                        .increment(1);
                        warn!(endpoint = %endpoint.name, ?deadline, retry, "Attempt timed out");
                    }
                    Err(BreakerError::Inner(error)) => {
                        attempts.push(Attempt {
                            endpoint: endpoint.name.clone(),
                            outcome: AttemptOutcome::Failed,
                        });
                        self.record_attempt(&endpoint.name, classification.intent, AttemptOutcome::Failed);
                        metrics::counter!(
                            "relay_errors_total",
                            "endpoint" => sanitize_label(&endpoint.name),
                            "kind" => error.kind()
                        )
                        .increment(1);
                        warn!(endpoint = %endpoint.name, %error, retry, "Attempt failed");
                    }
                }
            }
        }

        // Every live candidate exhausted; the chain's cache and degraded
        // tiers guarantee a response from here.
        let recovered = self.chain.recover(fingerprint)?;
        let tier = recovered.tier;
        metrics::counter!(
            "relay_fallbacks_total",
            "from" => endpoints_tried
                .last()
                .map(|name| sanitize_label(name))
                .unwrap_or_else(|| "none".to_string()),
            "to" => tier.as_str()
        )
        .increment(1);
        info!(
            tier = tier.as_str(),
            intent = %classification.intent,
            "Request served by fallback tier"
        );

        let decision = RoutingDecision {
            model_id: None,
            intent: classification.intent,
            confidence: classification.confidence,
            attempts,
            endpoints_tried,
            fallback_used: true,
            tier_used: Some(tier),
            total_latency_seconds: start.elapsed().as_secs_f64(),
        };
        self.record_latency(&decision);
        Ok(DispatchOutcome {
            text: recovered.text,
            success: recovered.success,
            decision,
        })
    }

    /// Candidate order: configured primary for the intent followed by its
    /// fallback list, minus endpoints currently marked unhealthy. When the
    /// filter would leave nothing, it is not applied, so the dispatcher
    /// never refuses to try anything.
    fn candidate_order(&self, intent: Intent) -> Vec<&Endpoint> {
        let mut names: Vec<&str> = Vec::new();
        if let Some(primary) = self.routing.primary_for(intent.as_str()) {
            names.push(primary);
            for fallback in self.routing.fallbacks_for(primary) {
                if !names.contains(&fallback.as_str()) {
                    names.push(fallback);
                }
            }
        }

        let all: Vec<&Endpoint> = names
            .iter()
            .filter_map(|name| self.endpoints.get(*name))
            .collect();
        let healthy: Vec<&Endpoint> = all
            .iter()
            .copied()
            .filter(|endpoint| self.health.is_healthy(&endpoint.name))
            .collect();

        if healthy.is_empty() {
            all
        } else {
            healthy
        }
    }

    fn breaker_for(&self, endpoint: &Endpoint) -> Arc<CircuitBreaker> {
        let config = endpoint.breaker_config(self.breakers.defaults());
        self.breakers.get_or_create_with(&endpoint.name, Some(&config))
    }

    fn record_attempt(&self, endpoint: &str, intent: Intent, outcome: AttemptOutcome) {
        metrics::counter!(
            "relay_requests_total",
            "endpoint" => sanitize_label(endpoint),
            "intent" => intent.as_str(),
            "status" => outcome.as_str()
        )
        .increment(1);
    }

    fn record_latency(&self, decision: &RoutingDecision) {
        metrics::histogram!(
            "relay_request_duration_seconds",
            "intent" => decision.intent.as_str()
        )
        .record(decision.total_latency_seconds);
    }
}
