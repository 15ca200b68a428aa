//! Guard configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::domain::PressureAction;
use crate::domain::PressureMetric;
use crate::domain::SignalScope;

const DEFAULT_THRESHOLD: f64 = 0.9;
const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1000;

const THRESHOLD_ENV: &str = "OOM_GUARD_THRESHOLD";
const REFRESH_INTERVAL_ENV: &str = "OOM_GUARD_REFRESH_INTERVAL_MS";
const ACTION_ENV: &str = "OOM_GUARD_ACTION";
const SIGNAL_SCOPE_ENV: &str = "OOM_GUARD_SIGNAL_SCOPE";
const METRIC_ENV: &str = "OOM_GUARD_METRIC";

#[derive(Debug, Clone, PartialEq)]
pub struct GuardConfig {
    threshold: f64,
    refresh_interval: Duration,
    action: PressureAction,
    signal_scope: SignalScope,
    metric: PressureMetric,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            action: PressureAction::default(),
            signal_scope: SignalScope::default(),
            metric: PressureMetric::default(),
        }
    }
}

impl GuardConfig {
    /// Fraction of total memory above which the gate fires.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Zero means the OS report is read on every check.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn action(&self) -> PressureAction {
        self.action
    }

    pub fn signal_scope(&self) -> SignalScope {
        self.signal_scope
    }

    /// System-wide usage or this process's resident set.
    pub fn metric(&self) -> PressureMetric {
        self.metric
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            threshold: parse_env(THRESHOLD_ENV, defaults.threshold),
            refresh_interval: Duration::from_millis(parse_env(
                REFRESH_INTERVAL_ENV,
                DEFAULT_REFRESH_INTERVAL_MS,
            )),
            action: parse_env(ACTION_ENV, defaults.action),
            signal_scope: parse_env(SIGNAL_SCOPE_ENV, defaults.signal_scope),
            metric: parse_env(METRIC_ENV, defaults.metric),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_action(mut self, action: PressureAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_signal_scope(mut self, scope: SignalScope) -> Self {
        self.signal_scope = scope;
        self
    }

    pub fn with_metric(mut self, metric: PressureMetric) -> Self {
        self.metric = metric;
        self
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return default,
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return default;
    }
    match trimmed.parse::<T>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(value = %value, key, "Invalid config value; using default");
            default
        }
    }
}
