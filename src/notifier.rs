//! Transition notifications
//!
//! A [`NotificationPayload`] is built per notified target and handed to a
//! [`Notifier`]. [`SinkNotifier`] routes `down` and `up` events to separate
//! sinks and retries failed deliveries a bounded number of times.

use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{Delivery, Sink};
use crate::discord::DiscordManager;
use crate::registry::Target;

/// Kind of transition being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Down,
    Up,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Down => write!(f, "down"),
            EventKind::Up => write!(f, "up"),
        }
    }
}

/// Body sent to a generic webhook sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    #[serde(rename = "event")]
    pub event_kind: EventKind,
    #[serde(rename = "name")]
    pub target_name: String,
    #[serde(rename = "url")]
    pub canonical_url: String,
    pub admin_url: String,
    pub dashboard_url: String,
    pub message: String,
    #[serde(rename = "tryUrl")]
    pub recheck_url: String,
    pub timestamp: String,
}

impl NotificationPayload {
    pub fn new(
        event_kind: EventKind,
        target: &Target,
        message: impl ToString,
        recheck_url: impl ToString,
    ) -> Self {
        Self {
            event_kind,
            target_name: target.name.clone(),
            canonical_url: target.url.clone(),
            admin_url: target.admin_url.clone(),
            dashboard_url: target.dashboard_url.clone(),
            message: message.to_string(),
            recheck_url: recheck_url.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Reasons a notification could not be delivered
#[derive(Debug)]
pub enum NotifyError {
    /// No sink is configured for this kind of event
    NoSink(EventKind),

    /// The sink answered with a non-success status
    Rejected { status: u16, attempts: u32 },

    /// The sink could not be reached
    Transport { message: String, attempts: u32 },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::NoSink(kind) => write!(f, "no sink configured for {} events", kind),
            NotifyError::Rejected { status, attempts } => write!(
                f,
                "sink rejected notification with status {} after {} attempt(s)",
                status, attempts
            ),
            NotifyError::Transport { message, attempts } => write!(
                f,
                "sink unreachable after {} attempt(s): {}",
                attempts, message
            ),
        }
    }
}

impl std::error::Error for NotifyError {}

/// Something that delivers transition notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, payload: &NotificationPayload) -> Result<(), NotifyError>;
}

/// Notifier posting to the configured down/up sinks
#[derive(Debug, Clone)]
pub struct SinkNotifier {
    client: Client,
    down_sink: Option<Sink>,
    up_sink: Option<Sink>,
    delivery: Delivery,
    discord_manager: DiscordManager,
}

impl SinkNotifier {
    pub fn new(
        down_sink: Option<Sink>,
        up_sink: Option<Sink>,
        delivery: Delivery,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(delivery.timeout).build()?;

        Ok(Self {
            client,
            down_sink,
            up_sink,
            delivery,
            discord_manager: DiscordManager::new(),
        })
    }

    fn sink_for(&self, kind: EventKind) -> Option<&Sink> {
        match kind {
            EventKind::Down => self.down_sink.as_ref(),
            EventKind::Up => self.up_sink.as_ref(),
        }
    }

    /// Deliver one body, retrying with doubling backoff
    async fn post_with_retry<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<(), NotifyError> {
        let attempts = self.delivery.attempts.max(1);
        let mut backoff = self.delivery.backoff;
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
            }

            match self.client.post(url).json(body).send().await {
                Ok(response) if response.status().is_success() => {
                    info!("notification delivered (attempt {attempt})");
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status();
                    warn!("sink answered {status} (attempt {attempt}/{attempts})");
                    if let Ok(text) = response.text().await {
                        debug!("sink error response: {text}");
                    }
                    last_error = Some(NotifyError::Rejected {
                        status: status.as_u16(),
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    warn!("failed to reach sink: {e} (attempt {attempt}/{attempts})");
                    last_error = Some(NotifyError::Transport {
                        message: e.to_string(),
                        attempts: attempt,
                    });
                }
            }
        }

        Err(last_error.unwrap_or(NotifyError::Transport {
            message: String::from("no delivery attempted"),
            attempts: 0,
        }))
    }
}

#[async_trait]
impl Notifier for SinkNotifier {
    #[instrument(skip(self, payload), fields(event = %payload.event_kind, target = %payload.target_name))]
    async fn notify(&self, payload: &NotificationPayload) -> Result<(), NotifyError> {
        let Some(sink) = self.sink_for(payload.event_kind) else {
            return Err(NotifyError::NoSink(payload.event_kind));
        };

        let result = match sink {
            Sink::Webhook(webhook) => self.post_with_retry(&webhook.url, payload).await,
            Sink::Discord(discord) => {
                let message = self.discord_manager.build_message(discord, payload);
                self.post_with_retry(&discord.url, &message).await
            }
        };

        if let Err(e) = &result {
            error!("giving up on notification: {e}");
        }

        result
    }
}
