//! Fast retry through the in-process dispatcher
//!
//! These tests verify that:
//! - A full sweep's fast retry rechecks the target and confirms recovery
//! - A recheck that still finds the target down does not retry again
//! - `POST /retry` goes through the same dispatcher

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use site_monitoring::{
    SweepRequest, SweepSettings,
    actors::dispatcher::DispatchHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

fn fast_settings() -> SweepSettings {
    SweepSettings {
        fast_retry_delay: Duration::from_millis(200),
        ..create_test_settings()
    }
}

async fn mount_sinks(sinks: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(sinks)
        .await;
}

#[tokio::test]
async fn test_fast_retry_confirms_recovery() {
    let targets = MockServer::start().await;
    let sinks = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&targets)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&targets)
        .await;
    mount_sinks(&sinks).await;

    let (dispatch, receiver) = DispatchHandle::channel();
    let orchestrator = create_test_orchestrator(
        vec![create_test_target("Forms", &targets, "/health")],
        &sinks,
        Arc::new(dispatch.clone()),
        fast_settings(),
    );
    DispatchHandle::spawn_actor(orchestrator.clone(), receiver);

    let outcome = orchestrator.run_sweep(SweepRequest::full()).await;
    assert_eq!(outcome.retries_scheduled, 1);

    tokio::time::sleep(Duration::from_millis(1000)).await;

    let down = sink_payloads(&sinks, "/down").await;
    let up = sink_payloads(&sinks, "/up").await;
    assert_eq!(down.len(), 1);
    assert!(down[0]["message"].as_str().unwrap().contains("(Retrying in 200ms...)"));
    assert_eq!(up.len(), 1);
    assert_eq!(up[0]["name"], "Forms");

    dispatch.shutdown().await;
}

#[tokio::test]
async fn test_persistent_outage_hands_over_to_slow_sweep() {
    let targets = MockServer::start().await;
    let sinks = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&targets)
        .await;
    mount_sinks(&sinks).await;

    let (dispatch, receiver) = DispatchHandle::channel();
    let orchestrator = create_test_orchestrator(
        vec![create_test_target("Forms", &targets, "/health")],
        &sinks,
        Arc::new(dispatch.clone()),
        fast_settings(),
    );
    DispatchHandle::spawn_actor(orchestrator.clone(), receiver);

    orchestrator.run_sweep(SweepRequest::full()).await;
    tokio::time::sleep(Duration::from_millis(1200)).await;

    let down = sink_payloads(&sinks, "/down").await;
    assert_eq!(down.len(), 2);
    assert!(down[1]["message"].as_str().unwrap().contains("(Retrying in 15m...)"));
    assert!(sink_payloads(&sinks, "/up").await.is_empty());
    // one full sweep plus one recheck
    assert_eq!(targets.received_requests().await.unwrap().len(), 2);

    dispatch.shutdown().await;
}

#[tokio::test]
async fn test_retry_endpoint_uses_dispatcher() {
    let targets = MockServer::start().await;
    let sinks = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&targets)
        .await;
    mount_sinks(&sinks).await;

    let (dispatch, receiver) = DispatchHandle::channel();
    let scheduler = Arc::new(dispatch.clone());
    let orchestrator = create_test_orchestrator(
        vec![create_test_target("PDF Service", &targets, "/create")],
        &sinks,
        scheduler.clone(),
        fast_settings(),
    );
    DispatchHandle::spawn_actor(orchestrator.clone(), receiver);

    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        internal_secret: None,
    };
    let addr = spawn_api_server(config, ApiState::new(orchestrator, scheduler))
        .await
        .unwrap();

    let start = Instant::now();
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/retry"))
        .json(&json!({ "siteName": "pdf service", "retryInMs": 800 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
    assert!(start.elapsed() < Duration::from_millis(800));
    assert!(sink_payloads(&sinks, "/up").await.is_empty());

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let up = sink_payloads(&sinks, "/up").await;
    assert_eq!(up.len(), 1);
    assert_eq!(up[0]["name"], "PDF Service");

    dispatch.shutdown().await;
}
