//! Shared test utilities for relay integration tests.
//!
//! Provides helpers for building gateway configurations wired to wiremock
//! backends and for reading response bodies.

#![allow(dead_code)]

use axum::body::Body;
use futures::StreamExt;
use relay::api::{create_router, AppState};
use relay::config::RelayConfig;
use std::sync::Arc;
use wiremock::MockServer;

/// A gateway config with two endpoints ("primary", "secondary") pointing at
/// the given mock servers. Intent routing sends everything to primary with
/// secondary as the fallback; retries are disabled so tests stay fast.
pub fn two_endpoint_config(primary: &MockServer, secondary: &MockServer) -> RelayConfig {
    let toml = format!(
        r#"
        [server]
        port = 8000

        [routing]
        max_retries = 0
        backoff_base_ms = 1
        backoff_max_ms = 2

        [routing.intents]
        code = "primary"
        reasoning = "primary"
        general = "primary"

        [routing.fallbacks]
        primary = ["secondary"]

        [fallback]
        tiers = ["primary", "secondary"]
        degraded_text = "All backends are temporarily unavailable."

        [health_check]
        enabled = false

        [[endpoints]]
        name = "primary"
        url = "{}"
        model = "test-model"
        capability = "code"

        [[endpoints]]
        name = "secondary"
        url = "{}"
        model = "test-model"
        "#,
        primary.uri(),
        secondary.uri()
    );
    let config: RelayConfig = toml::from_str(&toml).expect("test config must parse");
    config.validate().expect("test config must validate");
    config
}

/// Build the router and its state from a config.
pub fn make_app(config: RelayConfig) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Arc::new(config)));
    (create_router(state.clone()), state)
}

/// A valid OpenAI-shaped completion response body.
pub fn completion_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1699999999,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 5,
            "total_tokens": 15
        }
    })
}

/// A minimal inbound chat request body.
pub fn chat_request_body(content: &str) -> String {
    serde_json::json!({
        "messages": [{"role": "user", "content": content}]
    })
    .to_string()
}

/// Helper to read body as string.
pub async fn body_to_string(body: Body) -> String {
    let mut body_stream = body.into_data_stream();
    let mut result = String::new();
    while let Some(chunk) = body_stream.next().await {
        if let Ok(bytes) = chunk {
            result.push_str(&String::from_utf8_lossy(&bytes));
        }
    }
    result
}
