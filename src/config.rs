use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use tracing::{trace, warn};

use crate::registry::{Registry, RegistryError, Target};
use crate::util;

/// Destination for one kind of notification
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sink {
    Discord(Discord),
    Webhook(Webhook),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Webhook {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Discord {
    pub url: String,
    pub user_id: Option<String>,
}

/// Whether a target that stays down is re-alerted on every sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownAlertPolicy {
    /// Send a down notification on every sweep that sees the target down
    #[default]
    EverySweep,
    /// Send one down notification, then stay quiet until the target is seen up
    UntilRecovered,
}

/// Retry behaviour for notification delivery
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Delivery {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Wait before the second attempt, doubled for each further attempt
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub backoff: Duration,

    /// Upper bound for a single delivery attempt
    #[serde(default = "default_delivery_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for Delivery {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff: default_backoff(),
            timeout: default_delivery_timeout(),
        }
    }
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff() -> Duration {
    Duration::from_millis(500)
}

fn default_delivery_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Monitored targets (the compiled-in registry is used if absent)
    pub targets: Option<Vec<Target>>,

    pub down_sink: Option<Sink>,

    pub up_sink: Option<Sink>,

    /// Public base URL of this service, used for recheck links
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Upper bound for a single probe
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,

    /// Cooldown before the self-triggered recheck of a down target
    #[serde(default = "default_fast_retry_delay", with = "humantime_serde")]
    pub fast_retry_delay: Duration,

    /// Period of the external sweep trigger (only used in messages)
    #[serde(default = "default_slow_retry_interval", with = "humantime_serde")]
    pub slow_retry_interval: Duration,

    /// Gap between successive down notifications
    #[serde(default = "default_pacing", with = "humantime_serde")]
    pub pacing: Duration,

    #[serde(default)]
    pub delivery: Delivery,

    #[serde(default)]
    pub down_alerts: DownAlertPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: None,
            down_sink: None,
            up_sink: None,
            app_url: default_app_url(),
            probe_timeout: default_probe_timeout(),
            fast_retry_delay: default_fast_retry_delay(),
            slow_retry_interval: default_slow_retry_interval(),
            pacing: default_pacing(),
            delivery: Delivery::default(),
            down_alerts: DownAlertPolicy::default(),
        }
    }
}

fn default_app_url() -> String {
    String::from("http://localhost:3000")
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_fast_retry_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_slow_retry_interval() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_pacing() -> Duration {
    Duration::from_secs(1)
}

/// Errors raised while loading the configuration
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Registry(RegistryError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "could not read configuration file: {}", err),
            ConfigError::Parse(err) => write!(f, "invalid configuration file: {}", err),
            ConfigError::Registry(err) => write!(f, "invalid target list: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Registry(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl From<RegistryError> for ConfigError {
    fn from(err: RegistryError) -> Self {
        ConfigError::Registry(err)
    }
}

impl Config {
    /// Overlay values from the environment
    ///
    /// Webhook variables replace the configured sinks with generic webhooks.
    pub fn apply_env(mut self) -> Self {
        if let Some(url) = util::get_down_webhook() {
            self.down_sink = Some(Sink::Webhook(Webhook { url }));
        }
        if let Some(url) = util::get_up_webhook() {
            self.up_sink = Some(Sink::Webhook(Webhook { url }));
        }
        if let Some(app_url) = util::get_app_url() {
            self.app_url = app_url;
        }
        self
    }

    /// Build the registry, falling back to the compiled-in targets
    pub fn registry(&self) -> Result<Registry, ConfigError> {
        match &self.targets {
            Some(targets) => Ok(Registry::new(targets.clone())?),
            None => Ok(Registry::builtin()),
        }
    }

    /// Log configuration gaps that silently drop notifications
    pub fn warn_missing_sinks(&self) {
        if self.down_sink.is_none() {
            warn!("no down sink configured, down notifications will be dropped");
        }
        if self.up_sink.is_none() {
            warn!("no up sink configured, recovery notifications will be dropped");
        }
    }
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    config.registry()?;
    Ok(config)
}

pub fn read_config_file(path: &str) -> Result<Config, ConfigError> {
    let file_content = std::fs::read_to_string(path)?;
    parse_config(&file_content).inspect(|config| trace!("loaded config: {config:?}"))
}
