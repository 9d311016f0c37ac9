//! Circuit breaker for a single named dependency
//!
//! A three-state machine (Closed / Open / Half-Open) that tracks consecutive
//! successes and failures. All mutable state lives behind one mutex so a
//! check-then-transition sequence is atomic with respect to other callers;
//! the wrapped operation itself always runs with the lock released.
//!
//! Transitions:
//! - Closed → Open when consecutive failures reach `failure_threshold`
//! - Open → Half-Open once `recovery_timeout` has elapsed since the last
//!   failure (checked lazily on the next call)
//! - Half-Open → Closed after `success_threshold` consecutive successes
//! - Half-Open → Open on any failure
//!
//! Both counters reset on every transition.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::clock::{Clock, SystemClock};
use super::{ConfigError, ConfigResult};
use crate::error::{ErrorClassification, Failure, FailureKind};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed, allowing requests
    Closed,
    /// Circuit is open, rejecting requests
    Open,
    /// Circuit is half-open, letting probe requests through
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Returned instead of invoking the operation while the circuit is open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Circuit breaker '{circuit_name}' is {state}")]
pub struct CircuitOpenError {
    /// Name of the rejecting breaker
    pub circuit_name: String,
    /// State at rejection time
    pub state: CircuitState,
}

impl From<CircuitOpenError> for Failure {
    fn from(err: CircuitOpenError) -> Self {
        Self::circuit_open(err.circuit_name, err.state)
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,
    /// Time to wait after the last failure before probing again
    pub recovery_timeout: Duration,
    /// Consecutive half-open successes needed to close the circuit
    pub success_threshold: u32,
    /// Failure kinds that count against the breaker; `None` counts all
    pub counted_kinds: Option<BTreeSet<FailureKind>>,
    /// Number of state transitions kept for reporting
    pub history_limit: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            success_threshold: 3,
            counted_kinds: None,
            history_limit: 10,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration builder
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] when a threshold or the history
    /// limit is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::invalid("failure_threshold must be at least 1"));
        }
        if self.success_threshold == 0 {
            return Err(ConfigError::invalid("success_threshold must be at least 1"));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::invalid("history_limit must be at least 1"));
        }
        Ok(())
    }

    fn counts(&self, kind: FailureKind) -> bool {
        self.counted_kinds.as_ref().map_or(true, |kinds| kinds.contains(&kind))
    }
}

/// Builder for [`CircuitBreakerConfig`]
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    /// Start from the defaults (5 failures, 60s recovery, 3 successes)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure threshold
    #[must_use]
    pub const fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Set the recovery timeout
    #[must_use]
    pub const fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.config.recovery_timeout = timeout;
        self
    }

    /// Set the success threshold
    #[must_use]
    pub const fn success_threshold(mut self, threshold: u32) -> Self {
        self.config.success_threshold = threshold;
        self
    }

    /// Count only the given failure kinds
    #[must_use]
    pub fn count_only(mut self, kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        self.config.counted_kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Set how many transitions are kept
    #[must_use]
    pub const fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Validate and build
    ///
    /// # Errors
    /// See [`CircuitBreakerConfig::validate`].
    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// One recorded state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    /// When the transition happened
    pub timestamp: DateTime<Utc>,
    /// State before
    pub old_state: CircuitState,
    /// State after
    pub new_state: CircuitState,
    /// Why it happened
    pub reason: String,
}

/// Snapshot of a breaker's counters, safe to hold after the lock is gone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreakerStats {
    /// Breaker name
    pub name: String,
    /// Current state
    pub state: CircuitState,
    /// Consecutive failures
    pub failure_count: u32,
    /// Consecutive successes
    pub success_count: u32,
    /// Lifetime calls that reached the operation
    pub total_requests: u64,
    /// Lifetime counted failures
    pub total_failures: u64,
    /// Lifetime successes
    pub total_successes: u64,
    /// `total_failures / total_requests`, zero before the first request
    pub failure_rate: f64,
    /// Last counted failure
    pub last_failure_time: Option<DateTime<Utc>>,
    /// Last success
    pub last_success_time: Option<DateTime<Utc>>,
    /// Most recent transitions, oldest first
    pub state_changes: Vec<StateTransition>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_at: Option<Instant>,
    last_failure_time: Option<DateTime<Utc>>,
    last_success_time: Option<DateTime<Utc>>,
    total_requests: u64,
    total_failures: u64,
    total_successes: u64,
    transitions: VecDeque<StateTransition>,
}

impl BreakerState {
    const fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_at: None,
            last_failure_time: None,
            last_success_time: None,
            total_requests: 0,
            total_failures: 0,
            total_successes: 0,
            transitions: VecDeque::new(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn failure_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_failures as f64 / self.total_requests as f64
        }
    }
}

/// Circuit breaker guarding one named dependency
///
/// Generic over the [`Clock`] so recovery timeouts can be tested without
/// sleeping.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
    clock: C,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &inner.state)
            .field("failure_count", &inner.failure_count)
            .field("success_count", &inner.success_count)
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker<SystemClock> {
    /// Create a breaker on the system clock
    ///
    /// # Errors
    /// Returns [`ConfigError`] if `config` is invalid.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(name, config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a breaker with a custom clock (useful for testing)
    ///
    /// # Errors
    /// Returns [`ConfigError`] if `config` is invalid.
    pub fn with_clock(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: C,
    ) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { name: name.into(), config, inner: Mutex::new(BreakerState::new()), clock })
    }

    /// Breaker name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Run `operation` under breaker protection
    ///
    /// Fails fast with `E::from(CircuitOpenError)` without invoking the
    /// operation while the circuit is open. Failures of the operation are
    /// returned unchanged.
    #[instrument(skip(self, operation), fields(circuit = %self.name))]
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ErrorClassification + From<CircuitOpenError>,
    {
        self.admit().map_err(E::from)?;
        let result = operation().await;
        self.observe(&result);
        result
    }

    /// Synchronous counterpart of [`execute`](Self::execute)
    #[instrument(skip(self, operation), fields(circuit = %self.name))]
    pub fn call<F, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: ErrorClassification + From<CircuitOpenError>,
    {
        self.admit().map_err(E::from)?;
        let result = operation();
        self.observe(&result);
        result
    }

    /// Re-evaluate time-based transitions and decide whether a call may run.
    fn admit(&self) -> Result<(), CircuitOpenError> {
        let mut inner = self.inner.lock();
        self.evaluate(&mut inner);
        if inner.state == CircuitState::Open {
            debug!(circuit = %self.name, "Circuit breaker rejecting call");
            return Err(CircuitOpenError { circuit_name: self.name.clone(), state: inner.state });
        }
        Ok(())
    }

    fn observe<T, E: ErrorClassification>(&self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.record_success(),
            Err(error) if self.config.counts(error.kind()) => self.record_failure(),
            Err(error) => {
                debug!(circuit = %self.name, kind = %error.kind(), "Uncounted failure ignored");
            }
        }
    }

    /// Record a successful operation
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.success_count += 1;
        inner.failure_count = 0;
        inner.total_successes += 1;
        inner.total_requests += 1;
        inner.last_success_time = Some(self.clock.utc_now());
        debug!(
            circuit = %self.name,
            state = %inner.state,
            success_count = inner.success_count,
            "Circuit breaker recorded success"
        );
        self.evaluate(&mut inner);
    }

    /// Record a counted failure
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count += 1;
        inner.success_count = 0;
        inner.total_failures += 1;
        inner.total_requests += 1;
        inner.last_failure_at = Some(self.clock.now());
        inner.last_failure_time = Some(self.clock.utc_now());
        warn!(
            circuit = %self.name,
            state = %inner.state,
            failure_count = inner.failure_count,
            "Circuit breaker recorded failure"
        );
        self.evaluate(&mut inner);
    }

    /// Current state, after applying any due time-based transition
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.evaluate(&mut inner);
        inner.state
    }

    /// Owned snapshot of the counters and recent transitions
    pub fn get_stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.lock();
        CircuitBreakerStats {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            total_requests: inner.total_requests,
            total_failures: inner.total_failures,
            total_successes: inner.total_successes,
            failure_rate: inner.failure_rate(),
            last_failure_time: inner.last_failure_time,
            last_success_time: inner.last_success_time,
            state_changes: inner.transitions.iter().cloned().collect(),
        }
    }

    /// Force the breaker closed and clear the consecutive counters
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.last_failure_at = None;
        self.transition(&mut inner, CircuitState::Closed, "Manual reset");
    }

    fn evaluate(&self, inner: &mut BreakerState) {
        match inner.state {
            CircuitState::Closed => {
                if inner.failure_count >= self.config.failure_threshold {
                    self.transition(inner, CircuitState::Open, "Failure threshold exceeded");
                }
            }
            CircuitState::Open => {
                let recovered = inner.last_failure_at.map_or(true, |at| {
                    self.clock.now().saturating_duration_since(at) >= self.config.recovery_timeout
                });
                if recovered {
                    self.transition(inner, CircuitState::HalfOpen, "Recovery timeout elapsed");
                }
            }
            CircuitState::HalfOpen => {
                if inner.success_count >= self.config.success_threshold {
                    self.transition(inner, CircuitState::Closed, "Success threshold met");
                } else if inner.failure_count > 0 {
                    self.transition(inner, CircuitState::Open, "Failure in half-open state");
                }
            }
        }
    }

    fn transition(&self, inner: &mut BreakerState, to: CircuitState, reason: &str) {
        let from = inner.state;
        inner.state = to;
        inner.failure_count = 0;
        inner.success_count = 0;
        inner.transitions.push_back(StateTransition {
            timestamp: self.clock.utc_now(),
            old_state: from,
            new_state: to,
            reason: reason.to_string(),
        });
        while inner.transitions.len() > self.config.history_limit {
            inner.transitions.pop_front();
        }

        if to == CircuitState::Open {
            warn!(
                circuit = %self.name,
                from = %from,
                reason,
                total_failures = inner.total_failures,
                "Circuit breaker opened"
            );
        } else {
            info!(circuit = %self.name, from = %from, to = %to, reason, "Circuit breaker transition");
        }
    }
}
