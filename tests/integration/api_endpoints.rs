//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - `GET /check` always answers with the fixed success body
//! - The `site` parameter is matched case-insensitively
//! - `POST /retry` acknowledges immediately and validates its payload
//! - The internal secret guards `POST /retry` only

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};
use site_monitoring::api::{ApiConfig, ApiState, CheckResponse, spawn_api_server};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

struct TestApi {
    addr: SocketAddr,
    scheduler: Arc<RecordingScheduler>,
    sinks: MockServer,
    _targets: MockServer,
}

// Helper to create test API server with one target answering `status`
async fn spawn_test_api(status: u16, internal_secret: Option<&str>) -> TestApi {
    let targets = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&targets)
        .await;
    let sinks = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&sinks)
        .await;

    let scheduler = Arc::new(RecordingScheduler::default());
    let orchestrator = create_test_orchestrator(
        vec![create_test_target("PDF Service", &targets, "/create")],
        &sinks,
        scheduler.clone(),
        create_test_settings(),
    );

    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        internal_secret: internal_secret.map(str::to_string),
    };
    let addr = spawn_api_server(config, ApiState::new(orchestrator, scheduler.clone()))
        .await
        .unwrap();

    TestApi {
        addr,
        scheduler,
        sinks,
        _targets: targets,
    }
}

#[tokio::test]
async fn test_check_returns_fixed_body_when_all_up() {
    let api = spawn_test_api(200, None).await;

    let response = reqwest::get(format!("http://{}/check", api.addr)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: CheckResponse = response.json().await.unwrap();
    assert_eq!(body, CheckResponse::passed());
    assert!(api.sinks.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_check_returns_fixed_body_when_down() {
    let api = spawn_test_api(500, None).await;

    let response = reqwest::get(format!("http://{}/check", api.addr)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok", "message": "Health check passed" }));
    assert_eq!(sink_payloads(&api.sinks, "/down").await.len(), 1);
    assert_eq!(api.scheduler.scheduled().len(), 1);
}

#[tokio::test]
async fn test_check_site_is_case_insensitive() {
    let api = spawn_test_api(200, None).await;

    for query in ["site=pdf%20service", "site=PDF+Service"] {
        let response = reqwest::get(format!("http://{}/check?{query}", api.addr))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let up = sink_payloads(&api.sinks, "/up").await;
    assert_eq!(up.len(), 2);
    assert!(up.iter().all(|payload| payload["name"] == "PDF Service"));
}

#[tokio::test]
async fn test_check_with_delay_never_schedules_retry() {
    let api = spawn_test_api(500, None).await;

    let response = reqwest::get(format!("http://{}/check?delay=50", api.addr))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let down = sink_payloads(&api.sinks, "/down").await;
    assert_eq!(down.len(), 1);
    assert!(down[0]["message"].as_str().unwrap().contains("(Retrying in 15m...)"));
    assert!(api.scheduler.scheduled().is_empty());
}

#[tokio::test]
async fn test_retry_accepted_and_scheduled() {
    let api = spawn_test_api(200, None).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/retry", api.addr))
        .json(&json!({ "siteName": "PDF Service" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "accepted");
    assert_eq!(
        api.scheduler.scheduled(),
        vec![(Duration::from_millis(30_000), "PDF Service".to_string())]
    );
}

#[tokio::test]
async fn test_retry_rejects_empty_site_name() {
    let api = spawn_test_api(200, None).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/retry", api.addr))
        .json(&json!({ "siteName": "  ", "retryInMs": 10 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
    assert!(api.scheduler.scheduled().is_empty());
}

#[tokio::test]
async fn test_retry_requires_internal_secret() {
    let api = spawn_test_api(200, Some("s3cret")).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/retry", api.addr);
    let body = json!({ "siteName": "PDF Service", "retryInMs": 10 });

    let missing = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = client
        .post(&url)
        .header("x-internal-secret", "nope")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

    let right = client
        .post(&url)
        .header("x-internal-secret", "s3cret")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(right.status(), StatusCode::ACCEPTED);
    assert_eq!(api.scheduler.scheduled().len(), 1);

    // the public check endpoint stays open
    let check = reqwest::get(format!("http://{}/check", api.addr)).await.unwrap();
    assert_eq!(check.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let api = spawn_test_api(200, None).await;

    let response = reqwest::get(format!("http://{}/health", api.addr)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}
