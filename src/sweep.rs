//! Sweep orchestration
//!
//! One sweep probes the whole registry concurrently, notifies every target
//! found down, hands each of them to the retry scheduler (full sweeps only)
//! and, when the request names a target, confirms its recovery.
//!
//! ```text
//! SweepRequest ─► [delay] ─► probe all (join) ─► partition
//!                                                  │
//!                   ┌──────────────────────────────┤
//!                   ▼                              ▼
//!     per down target (paced):          single-target mode:
//!       notify(down)                      named target up? ─► notify(up)
//!       schedule_after(fast retry)
//!       (full sweep only)
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{Config, DownAlertPolicy};
use crate::monitors::probe::{CheckResult, Prober};
use crate::notifier::{EventKind, NotificationPayload, Notifier};
use crate::registry::{Registry, Target};
use crate::scheduler::{RetryScheduler, check_link};

/// The unit of work driving one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepRequest {
    /// Selects single-target mode
    pub target_name_filter: Option<String>,

    /// Wait this long before probing
    pub delay: Option<Duration>,
}

impl SweepRequest {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn single(target_name: impl ToString) -> Self {
        Self {
            target_name_filter: Some(target_name.to_string()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// A sweep is a full sweep only if neither a target nor a delay was given
    pub fn mode(&self) -> SweepMode {
        if self.target_name_filter.is_none() && self.delay.is_none() {
            SweepMode::Full
        } else {
            SweepMode::Recheck
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepMode {
    /// Externally triggered sweep, allowed to spawn fast retries
    Full,
    /// Targeted or delayed sweep, never spawns further retries
    Recheck,
}

/// What a sweep did, for logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepOutcome {
    pub mode: SweepMode,
    pub probed: usize,
    pub down: usize,
    pub down_notified: usize,
    /// Down targets not re-alerted under [`DownAlertPolicy::UntilRecovered`]
    pub suppressed: usize,
    pub up_notified: usize,
    pub retries_scheduled: usize,
    pub failed_notifications: usize,
    pub failed_retries: usize,
}

impl SweepOutcome {
    fn new(mode: SweepMode) -> Self {
        Self {
            mode,
            probed: 0,
            down: 0,
            down_notified: 0,
            suppressed: 0,
            up_notified: 0,
            retries_scheduled: 0,
            failed_notifications: 0,
            failed_retries: 0,
        }
    }
}

/// Timing and policy knobs of the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSettings {
    pub app_url: String,
    pub fast_retry_delay: Duration,
    pub slow_retry_interval: Duration,
    pub pacing: Duration,
    pub down_alerts: DownAlertPolicy,
}

impl Default for SweepSettings {
    fn default() -> Self {
        (&Config::default()).into()
    }
}

impl From<&Config> for SweepSettings {
    fn from(config: &Config) -> Self {
        Self {
            app_url: config.app_url.clone(),
            fast_retry_delay: config.fast_retry_delay,
            slow_retry_interval: config.slow_retry_interval,
            pacing: config.pacing,
            down_alerts: config.down_alerts,
        }
    }
}

pub struct Orchestrator {
    registry: Arc<Registry>,
    prober: Arc<dyn Prober>,
    notifier: Arc<dyn Notifier>,
    scheduler: Arc<dyn RetryScheduler>,
    settings: SweepSettings,

    /// Lowercased names already alerted, only used by `UntilRecovered`
    alerted: Mutex<HashSet<String>>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<Registry>,
        prober: Arc<dyn Prober>,
        notifier: Arc<dyn Notifier>,
        scheduler: Arc<dyn RetryScheduler>,
        settings: SweepSettings,
    ) -> Self {
        Self {
            registry,
            prober,
            notifier,
            scheduler,
            settings,
            alerted: Mutex::new(HashSet::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }

    #[instrument(skip(self), fields(site = request.target_name_filter.as_deref().unwrap_or("*")))]
    pub async fn run_sweep(&self, request: SweepRequest) -> SweepOutcome {
        let mode = request.mode();
        let mut outcome = SweepOutcome::new(mode);

        if let Some(delay) = request.delay.filter(|delay| !delay.is_zero()) {
            info!("delaying sweep by {} ms", delay.as_millis());
            tokio::time::sleep(delay).await;
        }

        let results = join_all(
            self.registry
                .targets()
                .iter()
                .map(|target| self.prober.probe(target)),
        )
        .await;

        outcome.probed = results.len();
        let (down, up): (Vec<_>, Vec<_>) = results.into_iter().partition(CheckResult::is_down);
        outcome.down = down.len();
        self.forget_recovered(&up);

        let mut dispatched = false;
        for result in &down {
            let name = &result.target.name;

            if self.should_alert(&result.target) {
                if dispatched {
                    tokio::time::sleep(self.settings.pacing).await;
                }
                dispatched = true;

                let payload = NotificationPayload::new(
                    EventKind::Down,
                    &result.target,
                    self.down_message(result, mode),
                    check_link(&self.settings.app_url, name, None),
                );
                match self.notifier.notify(&payload).await {
                    Ok(()) => outcome.down_notified += 1,
                    Err(e) => {
                        error!("{name}: down notification lost: {e}");
                        outcome.failed_notifications += 1;
                    }
                }
            } else {
                debug!("{name}: still down, already alerted");
                outcome.suppressed += 1;
            }

            if mode == SweepMode::Full {
                match self
                    .scheduler
                    .schedule_after(self.settings.fast_retry_delay, name)
                {
                    Ok(()) => outcome.retries_scheduled += 1,
                    Err(e) => {
                        error!("{name}: could not schedule recheck: {e}");
                        outcome.failed_retries += 1;
                    }
                }
            }
        }

        if let Some(site) = &request.target_name_filter {
            self.confirm_recovery(site, &up, &mut outcome).await;
        }

        info!(
            "sweep finished: {} probed, {} down, {} down notified, {} up notified, {} retries",
            outcome.probed,
            outcome.down,
            outcome.down_notified,
            outcome.up_notified,
            outcome.retries_scheduled
        );

        outcome
    }

    async fn confirm_recovery(&self, site: &str, up: &[CheckResult], outcome: &mut SweepOutcome) {
        let Some(target) = self.registry.find(site) else {
            warn!("recheck requested for unknown target '{site}'");
            return;
        };

        let Some(result) = up.iter().find(|result| result.target.is_named(&target.name)) else {
            debug!("{}: still down, no recovery to confirm", target.name);
            return;
        };

        let payload = NotificationPayload::new(
            EventKind::Up,
            target,
            up_message(result),
            check_link(&self.settings.app_url, &target.name, None),
        );
        match self.notifier.notify(&payload).await {
            Ok(()) => outcome.up_notified += 1,
            Err(e) => {
                error!("{}: up notification lost: {e}", target.name);
                outcome.failed_notifications += 1;
            }
        }
    }

    fn down_message(&self, result: &CheckResult, mode: SweepMode) -> String {
        let retry_in = match mode {
            SweepMode::Full => self.settings.fast_retry_delay,
            SweepMode::Recheck => self.settings.slow_retry_interval,
        };

        let mut parts = vec![];
        if let Some(code) = result.response_code {
            parts.push(code.to_string());
        }
        parts.push(
            result
                .error_detail
                .clone()
                .unwrap_or_else(|| String::from("No response")),
        );
        parts.push(format!(
            "(Retrying in {}...)",
            humantime::format_duration(retry_in)
        ));

        parts.join(" ")
    }

    /// Whether a down target gets a notification this sweep
    fn should_alert(&self, target: &Target) -> bool {
        match self.settings.down_alerts {
            DownAlertPolicy::EverySweep => true,
            DownAlertPolicy::UntilRecovered => self
                .alerted
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .insert(target.name.to_lowercase()),
        }
    }

    fn forget_recovered(&self, up: &[CheckResult]) {
        if self.settings.down_alerts != DownAlertPolicy::UntilRecovered {
            return;
        }

        let mut alerted = self
            .alerted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for result in up {
            if alerted.remove(&result.target.name.to_lowercase()) {
                info!("{}: recovered", result.target.name);
            }
        }
    }
}

fn up_message(result: &CheckResult) -> String {
    match result.response_code {
        Some(code) => format!("{code} Back online"),
        None => String::from("Back online"),
    }
}
