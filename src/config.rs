//! Application-level configuration: scheduler cadence, reminder windows and
//! the optional push gateway endpoint.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MATCHDAY_BACK_CONFIG_PATH";

const DEFAULT_MATCH_REMINDER_WINDOW_SECS: u64 = 3_600;
const DEFAULT_EVENT_REMINDER_WINDOW_SECS: u64 = 7_200;
const DEFAULT_STATUS_TICK_SECS: u64 = 60;
const DEFAULT_REMINDER_TICK_SECS: u64 = 300;

/// Immutable runtime configuration shared across the application.
///
/// Read once at startup and constant thereafter.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// How long before kick-off a match reminder becomes eligible.
    pub match_reminder_window: Duration,
    /// How long before the start an event reminder becomes eligible.
    pub event_reminder_window: Duration,
    /// Period of the status scheduler.
    pub status_tick_interval: Duration,
    /// Period of the reminder schedulers.
    pub reminder_tick_interval: Duration,
    /// Push gateway endpoint; notifications are logged locally when unset.
    pub gateway_url: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded scheduler configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            match_reminder_window: Duration::from_secs(DEFAULT_MATCH_REMINDER_WINDOW_SECS),
            event_reminder_window: Duration::from_secs(DEFAULT_EVENT_REMINDER_WINDOW_SECS),
            status_tick_interval: Duration::from_secs(DEFAULT_STATUS_TICK_SECS),
            reminder_tick_interval: Duration::from_secs(DEFAULT_REMINDER_TICK_SECS),
            gateway_url: None,
        }
    }
}

/// JSON representation of the configuration file located at
/// [`DEFAULT_CONFIG_PATH`]. All fields are optional; absent ones keep their
/// defaults.
#[derive(Debug, Deserialize)]
struct RawConfig {
    match_reminder_window_secs: Option<u64>,
    event_reminder_window_secs: Option<u64>,
    status_tick_secs: Option<u64>,
    reminder_tick_secs: Option<u64>,
    gateway_url: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            match_reminder_window: value
                .match_reminder_window_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.match_reminder_window),
            event_reminder_window: value
                .event_reminder_window_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.event_reminder_window),
            status_tick_interval: value
                .status_tick_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.status_tick_interval),
            reminder_tick_interval: value
                .reminder_tick_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.reminder_tick_interval),
            gateway_url: value.gateway_url.filter(|url| !url.is_empty()),
        }
    }
}

/// Resolve the configuration path taking the environment override into
/// account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
