//! Runtime configuration.
//!
//! Every field has a default, so an empty TOML document is a valid configuration. Values are
//! resolved in this order: defaults, then the TOML file, then `ORDER_SYNC_*` environment
//! variables. The result is validated before use.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.message().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between reconciliation polls of each dashboard session.
    pub poll_interval_secs: u64,
    /// Queue length of every bus subscriber.
    pub subscriber_buffer: usize,
    /// Toasts kept per dashboard session.
    pub toast_capacity: usize,
    /// Consecutive failed poll cycles before a session reports degraded health.
    pub stale_after_failures: u32,
    /// Mailbox capacity of every actor.
    pub mailbox_size: usize,
    pub backoff: BackoffConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            subscriber_buffer: 64,
            toast_capacity: 20,
            stale_after_failures: 3,
            mailbox_size: 32,
            backoff: BackoffConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Retry policy for snapshot fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Retries after the first attempt of a cycle.
    pub max_retries: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 200,
            max_delay_ms: 5_000,
            max_retries: 3,
        }
    }
}

impl BackoffConfig {
    /// `base * 2^attempt`, capped at `max_delay_ms`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms))
    }
}

/// Fixed-window limit on mutating requests, per caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window_secs: 60,
        }
    }
}

impl Config {
    /// Reads a TOML file, applies environment overrides and validates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides fields from `ORDER_SYNC_*` variables as returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Parse(format!("{} has invalid value '{}'", key, value)))
        }

        if let Some(v) = lookup("ORDER_SYNC_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = parse("ORDER_SYNC_POLL_INTERVAL_SECS", v)?;
        }
        if let Some(v) = lookup("ORDER_SYNC_SUBSCRIBER_BUFFER") {
            self.subscriber_buffer = parse("ORDER_SYNC_SUBSCRIBER_BUFFER", v)?;
        }
        if let Some(v) = lookup("ORDER_SYNC_RATE_LIMIT_MAX_REQUESTS") {
            self.rate_limit.max_requests = parse("ORDER_SYNC_RATE_LIMIT_MAX_REQUESTS", v)?;
        }
        if let Some(v) = lookup("ORDER_SYNC_RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = parse("ORDER_SYNC_RATE_LIMIT_WINDOW_SECS", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.poll_interval_secs == 0, "poll_interval_secs must be positive"),
            (self.subscriber_buffer == 0, "subscriber_buffer must be positive"),
            (self.mailbox_size == 0, "mailbox_size must be positive"),
            (self.stale_after_failures == 0, "stale_after_failures must be positive"),
            (self.rate_limit.window_secs == 0, "rate_limit.window_secs must be positive"),
            (self.rate_limit.max_requests == 0, "rate_limit.max_requests must be positive"),
            (
                self.backoff.base_delay_ms > self.backoff.max_delay_ms,
                "backoff.base_delay_ms must not exceed backoff.max_delay_ms",
            ),
        ];
        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(ConfigError::Validation(message.to_string())),
            None => Ok(()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
