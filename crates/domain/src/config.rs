//! Configuration structures for the resilience layer
//!
//! Every section deserializes with defaults, so a config file only needs
//! the values it overrides. Durations are expressed in (fractional) seconds.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_DELAY_SECONDS, DEFAULT_ENTITY_TYPE, DEFAULT_EXECUTOR_NAME,
    DEFAULT_EXPONENTIAL_BASE, DEFAULT_FAILURE_THRESHOLD, DEFAULT_HIGH_ERROR_THRESHOLD,
    DEFAULT_LOG_LEVEL, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_SECONDS,
    DEFAULT_RECENT_WINDOW_SECONDS, DEFAULT_RECOVERY_TIMEOUT_SECONDS, DEFAULT_STATE_HISTORY_LIMIT,
    DEFAULT_SUCCESS_THRESHOLD, DEFAULT_TIMEOUT_SECONDS, MONITOR_OPERATION_TIMEOUTS,
};
use crate::errors::{Result, SumoguardError};
use crate::impl_str_conversions;

/// Top-level settings for one resilient executor and its error handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceSettings {
    /// Executor name, also used as the circuit breaker name
    pub name: String,
    pub retry: RetrySettings,
    pub circuit_breaker: CircuitBreakerSettings,
    pub timeouts: TimeoutSettings,
    pub error_handling: ErrorHandlingSettings,
    pub logging: LoggingSettings,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_EXECUTOR_NAME.to_string(),
            retry: RetrySettings::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
            timeouts: TimeoutSettings::default(),
            error_handling: ErrorHandlingSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ResilienceSettings {
    /// Check every section
    ///
    /// # Errors
    /// Returns `SumoguardError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(config_error("name must not be empty"));
        }
        self.retry.validate()?;
        self.circuit_breaker.validate()?;
        self.timeouts.validate()?;
        self.error_handling.validate()?;
        Ok(())
    }
}

/// Retry policy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_seconds: f64,
    pub max_delay_seconds: f64,
    pub exponential_base: f64,
    pub jitter: bool,
    /// Failure kind names (e.g. `api`, `rate_limit`); `None` keeps the
    /// built-in set
    pub retryable_kinds: Option<Vec<String>>,
    /// Retry API failures only for 5xx, 408 and 429
    pub require_retryable_status: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_seconds: DEFAULT_BASE_DELAY_SECONDS,
            max_delay_seconds: DEFAULT_MAX_DELAY_SECONDS,
            exponential_base: DEFAULT_EXPONENTIAL_BASE,
            jitter: true,
            retryable_kinds: None,
            require_retryable_status: false,
        }
    }
}

impl RetrySettings {
    fn validate(&self) -> Result<()> {
        if self.max_attempts < 1 {
            return Err(config_error("retry.max_attempts must be at least 1"));
        }
        let base = seconds("retry.base_delay_seconds", self.base_delay_seconds)?;
        let max = seconds("retry.max_delay_seconds", self.max_delay_seconds)?;
        if max < base {
            return Err(config_error("retry.max_delay_seconds must be >= base_delay_seconds"));
        }
        if !self.exponential_base.is_finite() || self.exponential_base < 1.0 {
            return Err(config_error("retry.exponential_base must be >= 1"));
        }
        Ok(())
    }

    /// Base delay as a `Duration`
    ///
    /// # Errors
    /// Returns `SumoguardError::Config` for negative or non-finite values.
    pub fn base_delay(&self) -> Result<Duration> {
        seconds("retry.base_delay_seconds", self.base_delay_seconds)
    }

    /// Delay cap as a `Duration`
    ///
    /// # Errors
    /// Returns `SumoguardError::Config` for negative or non-finite values.
    pub fn max_delay(&self) -> Result<Duration> {
        seconds("retry.max_delay_seconds", self.max_delay_seconds)
    }
}

/// Circuit breaker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub recovery_timeout_seconds: f64,
    pub success_threshold: u32,
    /// Failure kind names counted against the breaker; `None` counts all
    pub counted_kinds: Option<Vec<String>>,
    pub history_limit: usize,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout_seconds: DEFAULT_RECOVERY_TIMEOUT_SECONDS,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            counted_kinds: None,
            history_limit: DEFAULT_STATE_HISTORY_LIMIT,
        }
    }
}

impl CircuitBreakerSettings {
    fn validate(&self) -> Result<()> {
        if self.failure_threshold < 1 {
            return Err(config_error("circuit_breaker.failure_threshold must be at least 1"));
        }
        if self.success_threshold < 1 {
            return Err(config_error("circuit_breaker.success_threshold must be at least 1"));
        }
        if self.history_limit < 1 {
            return Err(config_error("circuit_breaker.history_limit must be at least 1"));
        }
        self.recovery_timeout().map(|_| ())
    }

    /// Recovery timeout as a `Duration`
    ///
    /// # Errors
    /// Returns `SumoguardError::Config` for negative or non-finite values.
    pub fn recovery_timeout(&self) -> Result<Duration> {
        seconds("circuit_breaker.recovery_timeout_seconds", self.recovery_timeout_seconds)
    }
}

/// Timeout settings: a default plus per-operation overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub default_seconds: f64,
    pub operations: BTreeMap<String, f64>,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            default_seconds: DEFAULT_TIMEOUT_SECONDS,
            operations: MONITOR_OPERATION_TIMEOUTS
                .iter()
                .map(|(name, secs)| ((*name).to_string(), *secs))
                .collect(),
        }
    }
}

impl TimeoutSettings {
    fn validate(&self) -> Result<()> {
        self.default_timeout()?;
        self.operation_timeouts().map(|_| ())
    }

    /// Default deadline as a `Duration`
    ///
    /// # Errors
    /// Returns `SumoguardError::Config` unless the value is positive.
    pub fn default_timeout(&self) -> Result<Duration> {
        positive_seconds("timeouts.default_seconds", self.default_seconds)
    }

    /// Per-operation deadlines as `Duration`s
    ///
    /// # Errors
    /// Returns `SumoguardError::Config` naming the first non-positive entry.
    pub fn operation_timeouts(&self) -> Result<Vec<(String, Duration)>> {
        self.operations
            .iter()
            .map(|(name, secs)| {
                positive_seconds(&format!("timeouts.operations.{name}"), *secs)
                    .map(|d| (name.clone(), d))
            })
            .collect()
    }
}

/// Error enhancement and statistics settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorHandlingSettings {
    /// Entity type handled by this pipeline, e.g. `monitor`
    pub entity_type: String,
    /// Operations whose 404s mean "entity not found"; `None` derives
    /// `get_`, `update_` and `delete_` operations from `entity_type`
    pub entity_scoped_operations: Option<Vec<String>>,
    /// Count at which one high-error-rate signal is raised per key
    pub high_error_threshold: u64,
    /// Trailing window for "recent" statistics
    pub recent_window_seconds: u64,
}

impl Default for ErrorHandlingSettings {
    fn default() -> Self {
        Self {
            entity_type: DEFAULT_ENTITY_TYPE.to_string(),
            entity_scoped_operations: None,
            high_error_threshold: DEFAULT_HIGH_ERROR_THRESHOLD,
            recent_window_seconds: DEFAULT_RECENT_WINDOW_SECONDS,
        }
    }
}

impl ErrorHandlingSettings {
    fn validate(&self) -> Result<()> {
        if self.entity_type.trim().is_empty() {
            return Err(config_error("error_handling.entity_type must not be empty"));
        }
        if self.high_error_threshold < 1 {
            return Err(config_error("error_handling.high_error_threshold must be at least 1"));
        }
        Ok(())
    }

    /// Operations treated as entity-scoped for 404 reclassification
    pub fn scoped_operations(&self) -> Vec<String> {
        self.entity_scoped_operations.clone().unwrap_or_else(|| {
            ["get", "update", "delete"]
                .iter()
                .map(|verb| format!("{verb}_{}", self.entity_type))
                .collect()
        })
    }

    /// Recent window as a `Duration`
    pub const fn recent_window(&self) -> Duration {
        Duration::from_secs(self.recent_window_seconds)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl_str_conversions!(LogFormat {
    Json => "json",
    Text => "text",
});

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `sumoguard_core=debug`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), format: LogFormat::Json }
    }
}

fn config_error(message: impl Into<String>) -> SumoguardError {
    SumoguardError::Config(message.into())
}

/// Convert non-negative finite seconds into a `Duration`.
pub fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| config_error(format!("{field} must be a non-negative number, got {value}")))
}

/// Convert strictly positive finite seconds into a `Duration`.
pub fn positive_seconds(field: &str, value: f64) -> Result<Duration> {
    let duration = seconds(field, value)?;
    if duration.is_zero() {
        return Err(config_error(format!("{field} must be positive, got {value}")));
    }
    Ok(duration)
}
