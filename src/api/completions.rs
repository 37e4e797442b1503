//! Chat completion handler.

use super::types::{ChatRequest, ChatResponse};
use super::{ApiError, AppState};
use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Handler for POST /v1/chat/completions.
///
/// Backend unavailability never produces an error here; the dispatcher
/// degrades through its tiers instead. The only error paths are request
/// validation and the misconfigured-degraded-tier defect.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.messages.is_empty() {
        return Err(ApiError::bad_request("messages array cannot be empty"));
    }
    if request.messages.iter().any(|m| m.role.is_empty()) {
        return Err(ApiError::bad_request("message role cannot be empty"));
    }

    let outcome = state.dispatcher.dispatch(&request).await.map_err(|e| {
        error!(%e, "Dispatch failed; degraded tier is misconfigured");
        ApiError::internal("The gateway is misconfigured and cannot serve a degraded response")
    })?;

    let mut headers = HeaderMap::new();
    if outcome.decision.fallback_used {
        headers.insert("x-relay-fallback", HeaderValue::from_static("true"));
    }

    let response = ChatResponse {
        id: format!("relay-{}", Uuid::new_v4()),
        created: chrono::Utc::now().timestamp(),
        text: outcome.text,
        success: outcome.success,
        routing: outcome.decision,
    };

    Ok((headers, Json(response)))
}
