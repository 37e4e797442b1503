//! Inbound request and response types.

use crate::dispatch::RoutingDecision;
use serde::{Deserialize, Serialize};

/// One chat message in the inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Inbound completion request.
///
/// No model field: the gateway picks the backend (and hence the model) from
/// the classified intent and the routing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Concatenated message content, used for intent classification.
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Outbound response: generated text plus the full routing decision.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub id: String,
    pub created: i64,
    pub text: String,
    /// `false` only when the degraded tier served this response.
    pub success: bool,
    pub routing: RoutingDecision,
}
