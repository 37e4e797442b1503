//! Integration tests for the gateway's HTTP surface.
//!
//! These tests drive the real router against wiremock backends to verify
//! end-to-end routing, fallback, and degradation behavior.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::Service;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completions_request(content: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .body(Body::from(common::chat_request_body(content)))
        .unwrap()
}

#[tokio::test]
async fn completion_served_by_primary() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::completion_response("Hello!")))
        .mount(&primary)
        .await;

    let (mut app, _) = common::make_app(common::two_endpoint_config(&primary, &secondary));
    let response = app.call(completions_request("hello there")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-relay-fallback").is_none());

    let body: serde_json::Value =
        serde_json::from_str(&common::body_to_string(response.into_body()).await).unwrap();
    assert_eq!(body["text"], "Hello!");
    assert_eq!(body["success"], true);
    assert_eq!(body["routing"]["model_id"], "primary");
    assert_eq!(body["routing"]["fallback_used"], false);
    assert!(body["routing"].get("tier_used").is_none());
}

#[tokio::test]
async fn failing_primary_falls_back_to_secondary() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&primary)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::completion_response("backup")))
        .mount(&secondary)
        .await;

    let (mut app, _) = common::make_app(common::two_endpoint_config(&primary, &secondary));
    let response = app.call(completions_request("hello there")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-relay-fallback")
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );

    let body: serde_json::Value =
        serde_json::from_str(&common::body_to_string(response.into_body()).await).unwrap();
    assert_eq!(body["text"], "backup");
    assert_eq!(body["routing"]["model_id"], "secondary");
    assert_eq!(body["routing"]["fallback_used"], true);
    assert_eq!(
        body["routing"]["endpoints_tried"],
        serde_json::json!(["primary", "secondary"])
    );
}

#[tokio::test]
async fn full_outage_returns_degraded_response_not_5xx() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    for server in [&primary, &secondary] {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(server)
            .await;
    }

    let (mut app, _) = common::make_app(common::two_endpoint_config(&primary, &secondary));
    let response = app.call(completions_request("hello there")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_str(&common::body_to_string(response.into_body()).await).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["text"], "All backends are temporarily unavailable.");
    assert_eq!(body["routing"]["tier_used"], "degraded");
    assert!(body["routing"]["model_id"].is_null());
}

#[tokio::test]
async fn identical_request_is_served_from_cache_after_outage() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    // One successful response, then the backend goes down.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::completion_response("warm")))
        .up_to_n_times(1)
        .mount(&primary)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&primary)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&secondary)
        .await;

    let (mut app, _) = common::make_app(common::two_endpoint_config(&primary, &secondary));

    let first = app.call(completions_request("cache me")).await.unwrap();
    let first: serde_json::Value =
        serde_json::from_str(&common::body_to_string(first.into_body()).await).unwrap();
    assert_eq!(first["text"], "warm");

    let second = app.call(completions_request("cache me")).await.unwrap();
    let second: serde_json::Value =
        serde_json::from_str(&common::body_to_string(second.into_body()).await).unwrap();
    assert_eq!(second["text"], "warm");
    assert_eq!(second["routing"]["tier_used"], "cache");
    assert_eq!(second["success"], true);
}

#[tokio::test]
async fn empty_messages_rejected_with_400() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    let (mut app, _) = common::make_app(common::two_endpoint_config(&primary, &secondary));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"messages": []}"#))
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value =
        serde_json::from_str(&common::body_to_string(response.into_body()).await).unwrap();
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn oversized_payload_rejected() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    let (mut app, _) = common::make_app(common::two_endpoint_config(&primary, &secondary));

    let large_content = "x".repeat(11 * 1024 * 1024);
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .body(Body::from(common::chat_request_body(&large_content)))
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn status_endpoint_reports_breakers_and_health() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::completion_response("ok")))
        .mount(&primary)
        .await;

    let (mut app, _) = common::make_app(common::two_endpoint_config(&primary, &secondary));

    // One dispatch so the primary's breaker exists.
    app.call(completions_request("hello")).await.unwrap();

    let request = Request::builder()
        .uri("/v1/status")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_str(&common::body_to_string(response.into_body()).await).unwrap();
    assert_eq!(body["health"].as_array().unwrap().len(), 2);
    let breakers = body["circuit_breakers"].as_array().unwrap();
    assert!(breakers.iter().any(|b| b["endpoint"] == "primary"));
    assert!(breakers
        .iter()
        .all(|b| b["state"] == "closed" || b["state"] == "open" || b["state"] == "half_open"));

    let endpoints = body["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 2);
    assert_eq!(endpoints[0]["name"], "primary");
    assert_eq!(endpoints[0]["model"], "test-model");
    assert_eq!(endpoints[0]["capability"], "code");
    assert!(endpoints[1].get("capability").is_none());
}

#[tokio::test]
async fn health_endpoint_reports_gateway_status() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    let (mut app, _) = common::make_app(common::two_endpoint_config(&primary, &secondary));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_str(&common::body_to_string(response.into_body()).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["endpoints_total"], 2);
}

#[tokio::test]
async fn metrics_endpoint_returns_prometheus_text() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    let (mut app, _) = common::make_app(common::two_endpoint_config(&primary, &secondary));

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    let (mut app, _) = common::make_app(common::two_endpoint_config(&primary, &secondary));

    let request = Request::builder()
        .uri("/unknown/path")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
