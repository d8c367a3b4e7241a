//! Helper functions for integration tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use site_monitoring::{
    Orchestrator, Registry, SweepSettings, Target,
    config::{Delivery, DownAlertPolicy, Sink, Webhook},
    monitors::probe::HttpProber,
    notifier::SinkNotifier,
    scheduler::{RetryScheduler, ScheduleError},
};
use wiremock::MockServer;

pub const APP_URL: &str = "https://monitor.example.com";

/// Scheduler that only remembers what it was asked to do
#[derive(Default)]
pub struct RecordingScheduler {
    pub scheduled: Mutex<Vec<(Duration, String)>>,
}

impl RecordingScheduler {
    pub fn scheduled(&self) -> Vec<(Duration, String)> {
        self.scheduled.lock().unwrap().clone()
    }
}

impl RetryScheduler for RecordingScheduler {
    fn schedule_after(&self, delay: Duration, target_name: &str) -> Result<(), ScheduleError> {
        self.scheduled
            .lock()
            .unwrap()
            .push((delay, target_name.to_string()));
        Ok(())
    }
}

/// Target whose probe URL points at `path` on the mock server
pub fn create_test_target(name: &str, server: &MockServer, path: &str) -> Target {
    Target::new(
        name,
        format!("{}/", server.uri()),
        format!("https://admin.example.com/{name}"),
        format!("https://dash.example.com/{name}"),
    )
    .with_probe_url(format!("{}{}", server.uri(), path))
}

pub fn create_test_settings() -> SweepSettings {
    SweepSettings {
        app_url: APP_URL.to_string(),
        fast_retry_delay: Duration::from_secs(30),
        slow_retry_interval: Duration::from_secs(15 * 60),
        pacing: Duration::from_millis(200),
        down_alerts: DownAlertPolicy::EverySweep,
    }
}

/// Notifier posting to `/down` and `/up` on the sink server
pub fn create_test_notifier(sinks: &MockServer) -> SinkNotifier {
    SinkNotifier::new(
        Some(Sink::Webhook(Webhook {
            url: format!("{}/down", sinks.uri()),
        })),
        Some(Sink::Webhook(Webhook {
            url: format!("{}/up", sinks.uri()),
        })),
        Delivery {
            attempts: 1,
            backoff: Duration::from_millis(10),
            timeout: Duration::from_millis(500),
        },
    )
    .unwrap()
}

pub fn create_test_orchestrator(
    targets: Vec<Target>,
    sinks: &MockServer,
    scheduler: Arc<dyn RetryScheduler>,
    settings: SweepSettings,
) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        Arc::new(Registry::new(targets).unwrap()),
        Arc::new(HttpProber::new(Duration::from_millis(500)).unwrap()),
        Arc::new(create_test_notifier(sinks)),
        scheduler,
        settings,
    ))
}

/// JSON bodies the sink server received on `path`
pub async fn sink_payloads(sinks: &MockServer, path: &str) -> Vec<serde_json::Value> {
    sinks
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == path)
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}
