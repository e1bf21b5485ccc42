#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Tunables for [`crate::Monitor`].
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// A key held longer than this counts again on its next key-down.
    pub key_repeat_timeout: Duration,
    /// Upper bound on a single run-loop pump.
    pub pump_interval: Duration,
    /// Pause between pumps.
    pub idle_sleep: Duration,
    /// How often held keys older than `key_repeat_timeout` are forgotten.
    pub stale_key_sweep: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            key_repeat_timeout: Duration::from_secs(2),
            pump_interval: Duration::from_millis(50),
            idle_sleep: Duration::from_millis(5),
            stale_key_sweep: Duration::from_secs(10),
        }
    }
}

impl MonitorConfig {
    /// Defaults, overridden by any of `ACTIVITY_TAP_KEY_TIMEOUT_MS`,
    /// `ACTIVITY_TAP_PUMP_MS`, `ACTIVITY_TAP_IDLE_SLEEP_MS` and
    /// `ACTIVITY_TAP_SWEEP_MS` that parse as milliseconds.
    pub fn from_env() -> MonitorConfig {
        let mut config = MonitorConfig::default();
        config.apply(|name| env::var(name).ok());
        config
    }

    fn apply<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let millis = |name: &str| {
            lookup(name)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };
        if let Some(value) = millis("ACTIVITY_TAP_KEY_TIMEOUT_MS") {
            self.key_repeat_timeout = value;
        }
        if let Some(value) = millis("ACTIVITY_TAP_PUMP_MS") {
            self.pump_interval = value;
        }
        if let Some(value) = millis("ACTIVITY_TAP_IDLE_SLEEP_MS") {
            self.idle_sleep = value;
        }
        if let Some(value) = millis("ACTIVITY_TAP_SWEEP_MS") {
            self.stale_key_sweep = value;
        }
    }
}
