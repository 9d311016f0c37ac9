//! Resilient executor - timeout, retry and circuit breaker in one call

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use sumoguard_common::error::{ErrorClassification, FailureKind};
use sumoguard_common::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitOpenError, Clock, ConfigError, RetryCancelled,
    RetryConfig, RetryExecutor, SystemClock, TimeoutElapsed, TimeoutManager,
};
use sumoguard_domain::{
    CircuitBreakerSettings, ResilienceSettings, Result, RetrySettings, SumoguardError,
    TimeoutSettings,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::health::{Health, HealthStatus, RetryPolicySummary};

/// Composition of the three resilience primitives for one dependency
///
/// `execute` nests them as timeout (outer), retry (middle) and circuit
/// breaker (inner): the deadline bounds the whole retry sequence, and every
/// attempt is gated by the breaker.
#[derive(Debug)]
pub struct ResilientExecutor<C: Clock = SystemClock> {
    name: String,
    timeouts: TimeoutManager,
    retry: RetryExecutor,
    breaker: CircuitBreaker<C>,
}

impl ResilientExecutor<SystemClock> {
    /// Create an executor on the system clock
    ///
    /// The breaker is named after the executor.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if either configuration is invalid.
    pub fn new(
        name: impl Into<String>,
        retry: RetryConfig,
        breaker: CircuitBreakerConfig,
        timeouts: TimeoutManager,
    ) -> std::result::Result<Self, ConfigError> {
        Self::with_clock(name, retry, breaker, timeouts, SystemClock)
    }

    /// Build an executor from loaded settings
    ///
    /// # Errors
    /// Returns `SumoguardError::Config` for invalid settings or unknown
    /// failure kind names.
    pub fn from_settings(settings: &ResilienceSettings) -> Result<Self> {
        Self::from_settings_with_clock(settings, SystemClock)
    }
}

impl<C: Clock> ResilientExecutor<C> {
    /// Create an executor whose breaker reads time from `clock`
    ///
    /// # Errors
    /// Returns [`ConfigError`] if either configuration is invalid.
    pub fn with_clock(
        name: impl Into<String>,
        retry: RetryConfig,
        breaker: CircuitBreakerConfig,
        timeouts: TimeoutManager,
        clock: C,
    ) -> std::result::Result<Self, ConfigError> {
        retry.validate()?;
        let name = name.into();
        let breaker = CircuitBreaker::with_clock(name.clone(), breaker, clock)?;
        Ok(Self { name, timeouts, retry: RetryExecutor::new(retry), breaker })
    }

    /// Build an executor from loaded settings with a custom clock
    ///
    /// # Errors
    /// Returns `SumoguardError::Config` for invalid settings or unknown
    /// failure kind names.
    pub fn from_settings_with_clock(settings: &ResilienceSettings, clock: C) -> Result<Self> {
        settings.validate()?;
        Self::with_clock(
            settings.name.clone(),
            retry_config(&settings.retry)?,
            breaker_config(&settings.circuit_breaker)?,
            timeout_manager(&settings.timeouts)?,
            clock,
        )
        .map_err(config_error)
    }

    /// Stop retrying once `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.retry = self.retry.with_cancellation(token);
        self
    }

    /// Executor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The breaker guarding every attempt
    pub const fn circuit_breaker(&self) -> &CircuitBreaker<C> {
        &self.breaker
    }

    /// The timeout registry, for runtime `set_timeout` calls
    pub const fn timeouts(&self) -> &TimeoutManager {
        &self.timeouts
    }

    /// Active retry policy
    pub const fn retry_config(&self) -> &RetryConfig {
        self.retry.config()
    }

    /// Run `operation` under timeout, retry and breaker protection
    ///
    /// `operation` is called once per attempt, so each attempt gets a fresh
    /// future. The effective deadline is `timeout_override`, else the
    /// timeout registered for `operation_name`, else the default.
    #[instrument(skip(self, operation), fields(executor = %self.name))]
    pub async fn execute<F, Fut, T, E>(
        &self,
        operation_name: &str,
        timeout_override: Option<Duration>,
        operation: F,
    ) -> std::result::Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: ErrorClassification
            + From<CircuitOpenError>
            + From<RetryCancelled>
            + From<TimeoutElapsed>,
    {
        let breaker = &self.breaker;
        let operation = &operation;
        let guarded = self.retry.execute(move || breaker.execute(operation));
        let result = self.timeouts.execute_with_timeout(operation_name, timeout_override, guarded).await;
        if let Err(err) = &result {
            debug!(operation = operation_name, kind = %err.kind(), "Resilient execution failed");
        }
        result
    }

    /// Health snapshot: breaker statistics, retry policy and coarse health
    pub fn get_health(&self) -> HealthStatus {
        // `state()` applies a due recovery transition before the snapshot
        self.breaker.state();
        let circuit_breaker = self.breaker.get_stats();
        HealthStatus {
            name: self.name.clone(),
            health: Health::from_breaker(&circuit_breaker),
            circuit_breaker,
            retry_config: RetryPolicySummary::from(self.retry.config()),
        }
    }
}

/// Convert retry settings into a validated [`RetryConfig`]
///
/// # Errors
/// Returns `SumoguardError::Config` for invalid values or kind names.
pub fn retry_config(settings: &RetrySettings) -> Result<RetryConfig> {
    let mut builder = RetryConfig::builder()
        .max_attempts(settings.max_attempts)
        .base_delay(settings.base_delay()?)
        .max_delay(settings.max_delay()?)
        .exponential_base(settings.exponential_base)
        .jitter(settings.jitter)
        .require_retryable_status(settings.require_retryable_status);
    if let Some(names) = &settings.retryable_kinds {
        builder = builder.retryable_kinds(parse_kinds(names)?);
    }
    builder.build().map_err(config_error)
}

/// Convert breaker settings into a validated [`CircuitBreakerConfig`]
///
/// # Errors
/// Returns `SumoguardError::Config` for invalid values or kind names.
pub fn breaker_config(settings: &CircuitBreakerSettings) -> Result<CircuitBreakerConfig> {
    let mut builder = CircuitBreakerConfig::builder()
        .failure_threshold(settings.failure_threshold)
        .recovery_timeout(settings.recovery_timeout()?)
        .success_threshold(settings.success_threshold)
        .history_limit(settings.history_limit);
    if let Some(names) = &settings.counted_kinds {
        builder = builder.count_only(parse_kinds(names)?);
    }
    builder.build().map_err(config_error)
}

/// Build a [`TimeoutManager`] seeded with the configured table
///
/// # Errors
/// Returns `SumoguardError::Config` for non-positive timeouts.
pub fn timeout_manager(settings: &TimeoutSettings) -> Result<TimeoutManager> {
    TimeoutManager::with_timeouts(settings.default_timeout()?, settings.operation_timeouts()?)
        .map_err(config_error)
}

/// Parse failure kind names such as `api` or `rate_limit`
///
/// # Errors
/// Returns `SumoguardError::Config` naming the first unknown kind.
pub fn parse_kinds(names: &[String]) -> Result<BTreeSet<FailureKind>> {
    names.iter().map(|name| name.parse().map_err(SumoguardError::Config)).collect()
}

fn config_error(err: ConfigError) -> SumoguardError {
    SumoguardError::Config(err.to_string())
}
