//! Request and response bodies of the HTTP entry points

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sweep::SweepRequest;

/// Default wait of `POST /retry` when `retryInMs` is omitted
pub const DEFAULT_RETRY_IN_MS: u64 = 30_000;

/// Query string of `GET /check`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckQuery {
    /// Target name, matched case-insensitively
    pub site: Option<String>,

    /// Milliseconds to wait before probing
    ///
    /// Kept as text: any non-empty value marks the sweep as a recheck, even
    /// if it is not a valid number (in which case there is no wait).
    pub delay: Option<String>,
}

impl From<CheckQuery> for SweepRequest {
    fn from(query: CheckQuery) -> Self {
        let target_name_filter = query.site.filter(|site| !site.trim().is_empty());
        let delay = query
            .delay
            .filter(|delay| !delay.trim().is_empty())
            .map(|delay| Duration::from_millis(delay.trim().parse().unwrap_or(0)));

        SweepRequest {
            target_name_filter,
            delay,
        }
    }
}

/// Fixed answer of `GET /check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub status: String,
    pub message: String,
}

impl CheckResponse {
    pub fn passed() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Health check passed".to_string(),
        }
    }
}

/// Body of `POST /retry`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPayload {
    pub site_name: String,

    #[serde(default = "default_retry_in_ms")]
    pub retry_in_ms: u64,
}

fn default_retry_in_ms() -> u64 {
    DEFAULT_RETRY_IN_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
