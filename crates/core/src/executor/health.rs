//! Health reporting for resilient executors

use serde::Serialize;
use sumoguard_common::error::FailureKind;
use sumoguard_common::resilience::{CircuitBreakerStats, CircuitState, RetryConfig};
use sumoguard_domain::impl_str_conversions;

/// Failure rate above which a closed breaker is reported as degraded
pub const DEGRADED_FAILURE_RATE: f64 = 0.5;

/// Coarse health of a guarded dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    /// Breaker closed with a low failure rate
    Healthy,
    /// Breaker half-open, or closed with a high failure rate
    Degraded,
    /// Breaker open; calls are rejected
    Unhealthy,
}

impl_str_conversions!(Health {
    Healthy => "healthy",
    Degraded => "degraded",
    Unhealthy => "unhealthy",
});

impl Health {
    /// Derive health from a breaker snapshot
    ///
    /// Open is unhealthy. Half-open, or a lifetime failure rate above 50%,
    /// is degraded.
    pub fn from_breaker(stats: &CircuitBreakerStats) -> Self {
        match stats.state {
            CircuitState::Open => Self::Unhealthy,
            CircuitState::HalfOpen => Self::Degraded,
            CircuitState::Closed if stats.failure_rate > DEGRADED_FAILURE_RATE => Self::Degraded,
            CircuitState::Closed => Self::Healthy,
        }
    }
}

/// Serializable view of the retry policy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryPolicySummary {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay_seconds: f64,
    /// Cap on any single delay
    pub max_delay_seconds: f64,
    /// Growth factor between delays
    pub exponential_base: f64,
    /// Whether ±10% jitter is applied
    pub jitter: bool,
    /// Kinds that may be retried
    pub retryable_kinds: Vec<FailureKind>,
    /// Whether API failures also need a transient status
    pub require_retryable_status: bool,
}

impl From<&RetryConfig> for RetryPolicySummary {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay_seconds: config.base_delay.as_secs_f64(),
            max_delay_seconds: config.max_delay.as_secs_f64(),
            exponential_base: config.exponential_base,
            jitter: config.jitter,
            retryable_kinds: config.retryable_kinds.iter().copied().collect(),
            require_retryable_status: config.require_retryable_status,
        }
    }
}

/// Health snapshot returned by `ResilientExecutor::get_health`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    /// Executor name
    pub name: String,
    /// Health derived from the breaker
    pub health: Health,
    /// Breaker snapshot
    pub circuit_breaker: CircuitBreakerStats,
    /// Active retry policy
    pub retry_config: RetryPolicySummary,
}
