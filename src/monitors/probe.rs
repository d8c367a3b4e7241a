//! Reachability probes
//!
//! A probe issues a single `HEAD` request against a target and reduces the
//! outcome to a [`CheckResult`]. Transport errors are an expected outcome for
//! an unreachable site and are folded into a `Down` result, never returned as
//! an error.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::registry::Target;

/// Reachability of a target as seen by one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Up,
    Down,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Up => "up",
            Status::Down => "down",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of probing one target during one sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub target: Target,
    pub status: Status,
    pub response_code: Option<u16>,
    pub error_detail: Option<String>,
}

impl CheckResult {
    /// Classify an HTTP response status
    pub fn from_response(target: &Target, code: u16, reason: Option<&str>) -> Self {
        let success = (200..300).contains(&code);
        Self {
            target: target.clone(),
            status: if success { Status::Up } else { Status::Down },
            response_code: Some(code),
            error_detail: if success {
                None
            } else {
                reason.map(str::to_string)
            },
        }
    }

    /// Classify a transport failure
    pub fn unreachable(target: &Target, detail: impl ToString) -> Self {
        Self {
            target: target.clone(),
            status: Status::Down,
            response_code: None,
            error_detail: Some(detail.to_string()),
        }
    }

    pub fn is_down(&self) -> bool {
        self.status == Status::Down
    }
}

/// Something that can check whether a target is reachable
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target) -> CheckResult;
}

/// Prober backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Build a prober whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    #[instrument(skip(self, target), fields(target = %target.name))]
    async fn probe(&self, target: &Target) -> CheckResult {
        let url = target.check_url();

        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                debug!("{url}: {status}");
                CheckResult::from_response(target, status.as_u16(), status.canonical_reason())
            }
            Err(e) => {
                warn!("{url}: request failed: {e}");
                CheckResult::unreachable(target, describe_transport_error(&e))
            }
        }
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}
