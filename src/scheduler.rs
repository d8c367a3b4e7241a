//! Deferred single-target rechecks
//!
//! Sweeps decide *what* to retry; a [`RetryScheduler`] decides *how* the
//! retry is transported. The in-process implementation lives in
//! [`crate::actors::dispatcher`]; [`HttpScheduler`] re-enters the service
//! through its public `/check` endpoint.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error, instrument};

/// Header carrying the shared secret on internal calls
pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The component executing retries is gone
    Closed,

    /// Too many rechecks are already pending
    Busy,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::Closed => write!(f, "retry executor is no longer running"),
            ScheduleError::Busy => write!(f, "too many rechecks pending, try again later"),
        }
    }
}

impl std::error::Error for ScheduleError {}

/// Schedules a single-target sweep to run after `delay`
///
/// Implementations must return without waiting for the recheck itself.
pub trait RetryScheduler: Send + Sync {
    fn schedule_after(&self, delay: Duration, target_name: &str) -> Result<(), ScheduleError>;
}

/// Build the `/check` URL for a single target
pub fn check_link(app_url: &str, site: &str, delay: Option<Duration>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("site", site);
    if let Some(delay) = delay {
        query.append_pair("delay", &delay.as_millis().to_string());
    }

    format!("{}/check?{}", app_url.trim_end_matches('/'), query.finish())
}

/// Retries by calling this service's own `/check` endpoint
#[derive(Debug, Clone)]
pub struct HttpScheduler {
    client: Client,
    app_url: String,
    secret: Option<String>,
}

impl HttpScheduler {
    pub fn new(app_url: impl ToString, secret: Option<String>) -> Self {
        Self {
            client: Client::new(),
            app_url: app_url.to_string(),
            secret,
        }
    }
}

impl RetryScheduler for HttpScheduler {
    #[instrument(skip(self))]
    fn schedule_after(&self, delay: Duration, target_name: &str) -> Result<(), ScheduleError> {
        let url = check_link(&self.app_url, target_name, Some(delay));
        let mut request = self.client.get(&url);
        if let Some(secret) = &self.secret {
            request = request.header(INTERNAL_SECRET_HEADER, secret);
        }

        debug!("dispatching recheck via {url}");
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("{url}: recheck finished");
                }
                Ok(response) => error!("{url}: recheck answered {}", response.status()),
                Err(e) => error!("{url}: recheck could not be dispatched: {e}"),
            }
        });

        Ok(())
    }
}
