//! Outbound client abstraction for inference backends.
//!
//! Backends are reached as opaque HTTP services with a narrow contract:
//! accept an OpenAI-shaped completion request and return generated text, or
//! fail. The [`InferenceClient`] trait keeps that contract mockable; the
//! [`HttpUpstream`] implementation speaks the wire protocol with reqwest.

mod error;

pub use error::UpstreamError;

use crate::api::types::{ChatMessage, ChatRequest};
use crate::config::Endpoint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unified outbound interface for all inference backends.
///
/// Object-safe by design; the dispatcher, fallback chain, and health monitor
/// all hold it as `Arc<dyn InferenceClient>`.
#[async_trait]
pub trait InferenceClient: Send + Sync + 'static {
    /// Execute a completion call against `endpoint` and return the generated
    /// text. The effective per-call deadline is enforced by the caller's
    /// circuit breaker; implementations may carry a looser backstop of their
    /// own.
    async fn complete(&self, endpoint: &Endpoint, request: &ChatRequest)
        -> Result<String, UpstreamError>;

    /// Lightweight readiness probe. Success means the backend is able to
    /// serve traffic.
    async fn probe(&self, endpoint: &Endpoint) -> Result<(), UpstreamError>;
}

/// Wire request sent to a backend's completion endpoint.
#[derive(Debug, Serialize)]
struct CompletionPayload<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Minimal slice of an OpenAI-shaped completion response.
#[derive(Debug, Deserialize)]
struct CompletionReply {
    choices: Vec<ReplyChoice>,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

/// reqwest-backed implementation of [`InferenceClient`].
pub struct HttpUpstream {
    client: reqwest::Client,
    probe_timeout: Duration,
}

impl HttpUpstream {
    /// Build an upstream client.
    ///
    /// `request_timeout` is the client-wide deadline on completion calls,
    /// a backstop behind the tighter per-call breaker timeout.
    /// `probe_timeout` bounds readiness probes per request.
    pub fn new(request_timeout: Duration, probe_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            probe_timeout,
        }
    }
}

#[async_trait]
impl InferenceClient for HttpUpstream {
    async fn complete(
        &self,
        endpoint: &Endpoint,
        request: &ChatRequest,
    ) -> Result<String, UpstreamError> {
        let url = format!("{}/v1/chat/completions", endpoint.url);
        let payload = CompletionPayload {
            model: &endpoint.model,
            messages: &request.messages,
            max_tokens: request.max_tokens.or(endpoint.max_tokens),
            temperature: request.temperature.or(endpoint.temperature),
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let reply: CompletionReply = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| UpstreamError::InvalidResponse("response has no choices".to_string()))
    }

    async fn probe(&self, endpoint: &Endpoint) -> Result<(), UpstreamError> {
        let url = format!("{}{}", endpoint.url, endpoint.probe_path);
        let response = self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(UpstreamError::from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(UpstreamError::Upstream {
                status: status.as_u16(),
                message: "readiness probe failed".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ChatMessage;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint(url: &str) -> Endpoint {
        toml::from_str(&format!(
            r#"
            name = "ep"
            url = "{url}"
            model = "test-model"
            "#
        ))
        .unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hello".to_string(),
            }],
            max_tokens: None,
            temperature: None,
        }
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn complete_extracts_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("generated")))
            .mount(&server)
            .await;

        let upstream = HttpUpstream::new(Duration::from_secs(5), Duration::from_secs(1));
        let text = upstream
            .complete(&endpoint(&server.uri()), &request())
            .await
            .unwrap();
        assert_eq!(text, "generated");
    }

    #[tokio::test]
    async fn non_success_status_surfaces_as_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let upstream = HttpUpstream::new(Duration::from_secs(5), Duration::from_secs(1));
        let error = upstream
            .complete(&endpoint(&server.uri()), &request())
            .await
            .unwrap_err();
        assert!(matches!(error, UpstreamError::Upstream { status: 503, .. }));
    }

    #[tokio::test]
    async fn missing_choices_is_an_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let upstream = HttpUpstream::new(Duration::from_secs(5), Duration::from_secs(1));
        let error = upstream
            .complete(&endpoint(&server.uri()), &request())
            .await
            .unwrap_err();
        assert!(matches!(error, UpstreamError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn request_timeout_bounds_completion_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("late"))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let upstream = HttpUpstream::new(Duration::from_millis(100), Duration::from_secs(1));
        let error = upstream
            .complete(&endpoint(&server.uri()), &request())
            .await
            .unwrap_err();
        assert!(matches!(error, UpstreamError::Network(_)));
    }
}
