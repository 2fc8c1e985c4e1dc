//! Integration tests for ferment-relay HTTP endpoints
//!
//! Tests cover:
//! - POST /parse with the pattern strategy (match, partial match, no match)
//! - POST /parse with the model strategy (success, malformed reply, failures)
//! - GET /health reporting strategy and last error

mod helpers;

use axum::http::StatusCode;
use ferment_relay::build_router;
use ferment_relay::ExtractionError;
use helpers::{body_text, model_state, parse_request, pattern_state, ScriptedCompletion};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot` method

// =============================================================================
// Pattern strategy
// =============================================================================

#[tokio::test]
async fn test_pattern_message_is_recorded() {
    let (state, log) = pattern_state();
    let app = build_router(state);

    let response = app
        .oneshot(parse_request("Specific gravity = 1.052, temp 31.5", 1718000000))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response.into_body()).await, "Message processed");
    assert_eq!(log.rows(), vec!["1718000000,1.052,31.5"]);
}

#[tokio::test]
async fn test_pattern_partial_match_leaves_empty_column() {
    let (state, log) = pattern_state();
    let app = build_router(state);

    let response = app
        .oneshot(parse_request("TAMP -3", 1718000001))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(log.rows(), vec!["1718000001,,-3"]);
}

#[tokio::test]
async fn test_pattern_no_match_acknowledged_without_row() {
    let (state, log) = pattern_state();
    let app = build_router(state);

    let response = app
        .oneshot(parse_request("shift handover done", 1718000002))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response.into_body()).await, "Message processed");
    assert!(log.rows().is_empty());
    assert_eq!(log.contents(), "timestamp,specific_gravity,temperature\n");
}

#[tokio::test]
async fn test_replayed_message_appends_twice() {
    let (state, log) = pattern_state();

    for _ in 0..2 {
        let app = build_router(state.clone());
        let response = app
            .oneshot(parse_request("spgr 1.040", 1718000003))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(log.rows(), vec!["1718000003,1.04,", "1718000003,1.04,"]);
}

#[tokio::test]
async fn test_malformed_request_rejected() {
    let (state, log) = pattern_state();
    let app = build_router(state);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/parse")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(r#"{"message":{"body":"temp 3"}}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
    assert!(log.rows().is_empty());
}

// =============================================================================
// Model strategy
// =============================================================================

#[tokio::test]
async fn test_model_reply_is_recorded() {
    let client = ScriptedCompletion::replying(
        r#"{"fermenterNumber":3,"specificGravity":1.052,"temperature":null,"ph":4.5}"#,
    );
    let (state, log) = model_state(client.clone());
    let app = build_router(state);

    let response = app
        .oneshot(parse_request("F3 gravity 1.052 pH 4.5", 1718000100))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(log.rows(), vec!["1718000100,3,1.052,,4.5"]);
    assert_eq!(client.calls(), 1);
    assert!(client.prompts()[0].ends_with("F3 gravity 1.052 pH 4.5"));
}

#[tokio::test]
async fn test_model_all_null_reply_writes_nothing() {
    let client = ScriptedCompletion::replying(
        r#"{"fermenterNumber":null,"specificGravity":null,"temperature":null,"ph":null}"#,
    );
    let (state, log) = model_state(client);
    let app = build_router(state);

    let response = app
        .oneshot(parse_request("good morning", 1718000101))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(log.rows().is_empty());
}

#[tokio::test]
async fn test_model_non_json_reply_fails_without_row() {
    let client = ScriptedCompletion::replying("I cannot determine this.");
    let (state, log) = model_state(client);
    let app = build_router(state);

    let response = app
        .oneshot(parse_request("sg 1.050 temp 30", 1718000102))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response.into_body()).await;
    assert!(body.contains("Malformed response"), "body: {}", body);
    // No fallback to the pattern strategy
    assert!(log.rows().is_empty());
}

#[tokio::test]
async fn test_model_missing_credential_is_server_error() {
    let client = ScriptedCompletion::failing(|| {
        ExtractionError::ConfigurationMissing("completion API key not set".to_string())
    });
    let (state, log) = model_state(client);
    let app = build_router(state);

    let response = app
        .oneshot(parse_request("sg 1.050", 1718000103))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response.into_body())
        .await
        .contains("Configuration missing"));
    assert!(log.rows().is_empty());
}

#[tokio::test]
async fn test_model_service_failure_is_server_error() {
    let client = ScriptedCompletion::failing(|| {
        ExtractionError::ServiceUnavailable("connection refused".to_string())
    });
    let (state, log) = model_state(client);
    let app = build_router(state);

    let response = app
        .oneshot(parse_request("sg 1.050", 1718000104))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(log.rows().is_empty());
}

#[tokio::test]
async fn test_failure_does_not_affect_next_message() {
    let (state, log) = pattern_state();

    let first = build_router(state.clone())
        .oneshot(parse_request("nothing here", 1))
        .await
        .unwrap();
    let second = build_router(state)
        .oneshot(parse_request("temp 20", 2))
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(log.rows(), vec!["2,,20"]);
}

// =============================================================================
// Health endpoint
// =============================================================================

async fn get_health(app: axum::Router) -> Value {
    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_str(&body_text(response.into_body()).await).expect("Should parse JSON")
}

#[tokio::test]
async fn test_health_reports_strategy() {
    let (state, _log) = pattern_state();
    let body = get_health(build_router(state)).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "ferment-relay");
    assert_eq!(body["strategy"], "pattern");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_u64());
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_health_records_last_error() {
    let client = ScriptedCompletion::replying("not json");
    let (state, _log) = model_state(client);

    let response = build_router(state.clone())
        .oneshot(parse_request("sg 1.050", 1718000200))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = get_health(build_router(state)).await;
    assert_eq!(body["strategy"], "model");
    assert!(body["last_error"]
        .as_str()
        .unwrap()
        .starts_with("Malformed response"));
}
