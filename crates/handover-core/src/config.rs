//! Runtime configuration.
//!
//! # Environment Variables
//!
//! - `HANDOVER_NOTIFICATION_TTL_HOURS`: notification retention (default 168, at most ten years)
//! - `HANDOVER_SWEEP_CONCURRENCY`: workers processed in parallel by a sweep (default 1)
//! - `HANDOVER_SWEEP_FAILURE_POLICY`: `continue` (default) or `fail-fast`
//! - `HANDOVER_DELIVERY_MODE`: `inline` (default) or `queued`
//! - `HANDOVER_DELIVERY_BUFFER`: queued delivery channel capacity (default 256)

use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

use crate::domain::notification::default_notification_ttl;

pub const NOTIFICATION_TTL_ENV: &str = "HANDOVER_NOTIFICATION_TTL_HOURS";
pub const SWEEP_CONCURRENCY_ENV: &str = "HANDOVER_SWEEP_CONCURRENCY";
pub const FAILURE_POLICY_ENV: &str = "HANDOVER_SWEEP_FAILURE_POLICY";
pub const DELIVERY_MODE_ENV: &str = "HANDOVER_DELIVERY_MODE";
pub const DELIVERY_BUFFER_ENV: &str = "HANDOVER_DELIVERY_BUFFER";

/// Ten years.
pub const MAX_NOTIFICATION_TTL_HOURS: i64 = 24 * 366 * 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// What a sweep does when one worker's engine call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log, record the failure in the report, move on to the next worker.
    #[default]
    Continue,
    /// Stop the sweep at the first failure.
    FailFast,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "fail-fast" | "fail_fast" | "failfast" => Ok(FailurePolicy::FailFast),
            other => Err(format!("expected `continue` or `fail-fast`, got `{other}`")),
        }
    }
}

/// How post-commit side effects are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Performed by the calling task right after commit.
    #[default]
    Inline,
    /// Handed to a background delivery loop through a bounded channel.
    Queued,
}

impl FromStr for DeliveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(DeliveryMode::Inline),
            "queued" => Ok(DeliveryMode::Queued),
            other => Err(format!("expected `inline` or `queued`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HandoverConfig {
    pub notification_ttl: Duration,
    pub sweep_concurrency: usize,
    pub failure_policy: FailurePolicy,
    pub delivery: DeliveryMode,
    pub delivery_buffer: usize,
}

impl Default for HandoverConfig {
    fn default() -> Self {
        Self {
            notification_ttl: default_notification_ttl(),
            sweep_concurrency: 1,
            failure_policy: FailurePolicy::Continue,
            delivery: DeliveryMode::Inline,
            delivery_buffer: 256,
        }
    }
}

impl HandoverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by whatever `HANDOVER_*` variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(NOTIFICATION_TTL_ENV) {
            let hours: i64 = parse(NOTIFICATION_TTL_ENV, &raw)?;
            if !(1..=MAX_NOTIFICATION_TTL_HOURS).contains(&hours) {
                return Err(invalid(
                    NOTIFICATION_TTL_ENV,
                    &raw,
                    &format!("must be between 1 and {MAX_NOTIFICATION_TTL_HOURS}"),
                ));
            }
            config.notification_ttl = Duration::try_hours(hours)
                .ok_or_else(|| invalid(NOTIFICATION_TTL_ENV, &raw, "out of range"))?;
        }
        if let Some(raw) = lookup(SWEEP_CONCURRENCY_ENV) {
            let n: usize = parse(SWEEP_CONCURRENCY_ENV, &raw)?;
            if n == 0 {
                return Err(invalid(SWEEP_CONCURRENCY_ENV, &raw, "must be at least 1"));
            }
            config.sweep_concurrency = n;
        }
        if let Some(raw) = lookup(FAILURE_POLICY_ENV) {
            config.failure_policy = parse(FAILURE_POLICY_ENV, &raw)?;
        }
        if let Some(raw) = lookup(DELIVERY_MODE_ENV) {
            config.delivery = parse(DELIVERY_MODE_ENV, &raw)?;
        }
        if let Some(raw) = lookup(DELIVERY_BUFFER_ENV) {
            let n: usize = parse(DELIVERY_BUFFER_ENV, &raw)?;
            if n == 0 {
                return Err(invalid(DELIVERY_BUFFER_ENV, &raw, "must be at least 1"));
            }
            config.delivery_buffer = n;
        }

        Ok(config)
    }

    pub fn with_notification_ttl(mut self, ttl: Duration) -> Self {
        self.notification_ttl = ttl;
        self
    }

    /// Values below 1 are clamped to 1.
    pub fn with_sweep_concurrency(mut self, n: usize) -> Self {
        self.sweep_concurrency = n.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_delivery(mut self, mode: DeliveryMode) -> Self {
        self.delivery = mode;
        self
    }

    pub fn with_delivery_buffer(mut self, n: usize) -> Self {
        self.delivery_buffer = n.max(1);
        self
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| invalid(var, raw, &e.to_string()))
}

fn invalid(var: &'static str, raw: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: reason.to_string(),
    }
}
