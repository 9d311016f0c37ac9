//! Exponential-backoff retry executor
//!
//! Re-invokes an async operation up to `max_attempts` times. Only failures
//! whose [`FailureKind`] is in the configured retryable set are retried;
//! anything else is returned immediately. With `require_retryable_status`
//! set, API failures are additionally retried only for 5xx, 408 and 429.
//!
//! The delay before retry `n` (0-based) is
//! `min(max_delay, base_delay * exponential_base^n)`, optionally perturbed by
//! uniform ±10% jitter. A failure advertising a retry-after hint waits at
//! least that long, still capped by `max_delay`. No delay follows the final
//! attempt.
//!
//! An optional [`CancellationToken`] stops the sequence cooperatively: it is
//! checked before every attempt and raced against every backoff sleep. An
//! attempt already in flight is never interrupted here.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::{ConfigError, ConfigResult};
use crate::error::{ErrorClassification, Failure, FailureKind};

/// Fraction of the computed delay used as the jitter half-width.
const JITTER_RATIO: f64 = 0.1;

/// Returned when the shutdown token fires between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Retry cancelled after {attempts} attempt(s)")]
pub struct RetryCancelled {
    /// Attempts made before cancellation
    pub attempts: u32,
}

impl From<RetryCancelled> for Failure {
    fn from(err: RetryCancelled) -> Self {
        Self::cancelled(None).with_context("attempts", err.attempts)
    }
}

/// Immutable retry policy
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any computed delay
    pub max_delay: Duration,
    /// Growth factor between consecutive delays
    pub exponential_base: f64,
    /// Whether to apply ±10% jitter
    pub jitter: bool,
    /// Failure kinds that may be retried
    pub retryable_kinds: BTreeSet<FailureKind>,
    /// Retry API failures only when their status is transient
    pub require_retryable_status: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            exponential_base: 2.0,
            jitter: true,
            retryable_kinds: Self::default_retryable_kinds(),
            require_retryable_status: false,
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Kinds retried unless configured otherwise: API errors, rate limits,
    /// timeouts and transport failures.
    pub fn default_retryable_kinds() -> BTreeSet<FailureKind> {
        [FailureKind::Api, FailureKind::RateLimit, FailureKind::Timeout, FailureKind::Transport]
            .into_iter()
            .collect()
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if `max_attempts` is zero,
    /// `max_delay < base_delay`, or `exponential_base < 1`.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts < 1 {
            return Err(ConfigError::invalid("max_attempts must be at least 1"));
        }
        if self.max_delay < self.base_delay {
            return Err(ConfigError::invalid("max_delay must be >= base_delay"));
        }
        if !self.exponential_base.is_finite() || self.exponential_base < 1.0 {
            return Err(ConfigError::invalid("exponential_base must be >= 1"));
        }
        Ok(())
    }

    /// Whether failures of `kind` may be retried
    pub fn is_retryable(&self, kind: FailureKind) -> bool {
        self.retryable_kinds.contains(&kind)
    }

    /// Whether `error` may be retried under this policy
    ///
    /// The kind must be in the retryable set. When `require_retryable_status`
    /// is set, API failures also need a retryable status (5xx, 408, 429).
    pub fn should_retry<E: ErrorClassification>(&self, error: &E) -> bool {
        let kind = error.kind();
        if !self.is_retryable(kind) {
            return false;
        }
        !(self.require_retryable_status && kind == FailureKind::Api) || error.is_retryable()
    }

    /// Backoff before retry `attempt` after `error`
    ///
    /// The computed delay, raised to the failure's retry-after hint when one
    /// is present. The hint never pushes the wait past `max_delay`.
    pub fn delay_after<E: ErrorClassification>(&self, attempt: u32, error: &E) -> Duration {
        let delay = self.delay_for_attempt(attempt);
        match error.retry_after() {
            Some(hint) => delay.max(hint.min(self.max_delay)),
            None => delay,
        }
    }

    /// Deterministic delay before retry `attempt` (0-based), without jitter
    pub fn base_delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.exponential_base.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    /// Delay before retry `attempt` (0-based), with jitter when enabled
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay_for_attempt(attempt);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let secs = delay.as_secs_f64();
        let spread = secs * JITTER_RATIO;
        let jittered = secs + rand::thread_rng().gen_range(-spread..=spread);
        Duration::try_from_secs_f64(jittered.max(0.0)).unwrap_or(delay)
    }
}

/// Builder for [`RetryConfig`]
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    /// Start from the defaults (3 attempts, 1s base, 60s cap, base 2, jitter)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total number of attempts
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Set the base delay
    #[must_use]
    pub const fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    /// Set the delay cap
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    /// Set the growth factor
    #[must_use]
    pub const fn exponential_base(mut self, base: f64) -> Self {
        self.config.exponential_base = base;
        self
    }

    /// Enable or disable jitter
    #[must_use]
    pub const fn jitter(mut self, enabled: bool) -> Self {
        self.config.jitter = enabled;
        self
    }

    /// Replace the retryable kind set
    #[must_use]
    pub fn retryable_kinds(mut self, kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        self.config.retryable_kinds = kinds.into_iter().collect();
        self
    }

    /// Retry API failures only for transient statuses
    #[must_use]
    pub const fn require_retryable_status(mut self, enabled: bool) -> Self {
        self.config.require_retryable_status = enabled;
        self
    }

    /// Validate and build
    ///
    /// # Errors
    /// See [`RetryConfig::validate`].
    pub fn build(self) -> ConfigResult<RetryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Outcome of a retry execution including result and summary statistics.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Final result: the success value or the last failure
    pub result: Result<T, E>,
    /// Attempts actually made
    pub attempts: u32,
    /// Sum of the backoff delays slept
    pub total_delay: Duration,
    /// Whether the sequence ended because of cancellation
    pub cancelled: bool,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Retry executor with exponential backoff
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
    shutdown: Option<CancellationToken>,
}

impl RetryExecutor {
    /// Create an executor for `config`
    pub const fn new(config: RetryConfig) -> Self {
        Self { config, shutdown: None }
    }

    /// Stop retrying once `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    /// Active configuration
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` with retries, returning only the final result
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ErrorClassification + From<RetryCancelled>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Run `operation` with retries, returning the result and statistics
    #[instrument(skip(self, operation), fields(max_attempts = self.config.max_attempts))]
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ErrorClassification + From<RetryCancelled>,
    {
        let mut attempts = 0;
        let mut total_delay = Duration::ZERO;

        loop {
            if self.is_cancelled() {
                debug!(attempts, "Retry cancelled before next attempt");
                return Self::cancelled_outcome(attempts, total_delay);
            }

            attempts += 1;
            let error = match operation().await {
                Ok(value) => {
                    if attempts > 1 {
                        info!(attempts, "Operation succeeded after retry");
                    }
                    return RetryOutcome { result: Ok(value), attempts, total_delay, cancelled: false };
                }
                Err(error) => error,
            };

            let kind = error.kind();
            if !self.config.should_retry(&error) {
                debug!(attempts, kind = %kind, "Failure is not retryable");
                return RetryOutcome { result: Err(error), attempts, total_delay, cancelled: false };
            }
            if attempts >= self.config.max_attempts {
                error!(attempts, kind = %kind, "All retry attempts exhausted");
                return RetryOutcome { result: Err(error), attempts, total_delay, cancelled: false };
            }

            let delay = self.config.delay_after(attempts - 1, &error);
            warn!(
                attempt = attempts,
                max_attempts = self.config.max_attempts,
                kind = %kind,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Operation failed, retrying after backoff"
            );
            if !self.pause(delay).await {
                debug!(attempts, "Retry cancelled during backoff");
                return Self::cancelled_outcome(attempts, total_delay);
            }
            total_delay += delay;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Sleep for `delay`; `false` if cancelled first.
    async fn pause(&self, delay: Duration) -> bool {
        match &self.shutdown {
            Some(token) => tokio::select! {
                () = token.cancelled() => false,
                () = tokio::time::sleep(delay) => true,
            },
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }

    fn cancelled_outcome<T, E: From<RetryCancelled>>(
        attempts: u32,
        total_delay: Duration,
    ) -> RetryOutcome<T, E> {
        RetryOutcome {
            result: Err(E::from(RetryCancelled { attempts })),
            attempts,
            total_delay,
            cancelled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for retry logic
    //!
    //! Tests cover configuration validation, delay computation with and
    //! without jitter, attempt accounting, and cancellation.

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    /// Validates `RetryConfig::should_retry` behavior for the kind-only
    /// default scenario.
    ///
    /// Assertions:
    /// - Confirms every API failure is retried when `Api` is in the set.
    /// - Confirms kinds outside the set are not retried.
    #[test]
    fn test_should_retry_by_kind_by_default() {
        let config = RetryConfig::default();
        assert!(!config.require_retryable_status);
        assert!(config.should_retry(&Failure::api("unavailable", Some(503))));
        assert!(config.should_retry(&Failure::api("missing", Some(404))));
        assert!(config.should_retry(&Failure::api("no status", None)));
        assert!(config.should_retry(&Failure::timeout("op", Duration::from_secs(1))));
        assert!(!config.should_retry(&Failure::generic("boom")));

        let no_api = RetryConfig::builder().retryable_kinds([FailureKind::Timeout]).build().unwrap();
        assert!(!no_api.should_retry(&Failure::api("unavailable", Some(503))));
    }

    /// Validates `RetryConfig::should_retry` behavior for the status-gated
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms API failures then need a 5xx, 408 or 429 status.
    /// - Confirms other kinds are unaffected by the gate.
    #[test]
    fn test_should_retry_with_status_gate() {
        let config = RetryConfig::builder().require_retryable_status(true).build().unwrap();
        assert!(config.should_retry(&Failure::api("unavailable", Some(503))));
        assert!(config.should_retry(&Failure::api("throttled", Some(429))));
        assert!(config.should_retry(&Failure::api("slow", Some(408))));
        assert!(!config.should_retry(&Failure::api("missing", Some(404))));
        assert!(!config.should_retry(&Failure::api("no status", None)));
        assert!(config.should_retry(&Failure::timeout("op", Duration::from_secs(1))));
        assert!(config.should_retry(&Failure::transport("reset")));
    }

    /// Validates `RetryExecutor::execute` behavior for a client error under
    /// both API policies.
    ///
    /// Assertions:
    /// - Confirms a 404 is attempted `max_attempts` times by default.
    /// - Confirms the status gate stops it after one attempt.
    #[tokio::test(start_paused = true)]
    async fn test_client_error_attempts_follow_policy() {
        async fn attempts_for(config: RetryConfig) -> u32 {
            let calls = Arc::new(AtomicU32::new(0));
            let _ = RetryExecutor::new(config)
                .execute(|| {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err::<(), _>(Failure::api("not found", Some(404)))
                    }
                })
                .await;
            calls.load(Ordering::SeqCst)
        }

        assert_eq!(attempts_for(fast_config(3)).await, 3);

        let mut gated = fast_config(3);
        gated.require_retryable_status = true;
        assert_eq!(attempts_for(gated).await, 1);
    }

    /// Validates `RetryConfig::delay_after` behavior for the retry-after
    /// hint scenario.
    ///
    /// Assertions:
    /// - Confirms a hint longer than the backoff replaces it.
    /// - Confirms a shorter hint leaves the backoff alone.
    /// - Confirms the hint is capped by `max_delay`.
    #[test]
    fn test_delay_after_honors_retry_after_hint() {
        let config = RetryConfig::builder()
            .base_delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(10))
            .jitter(false)
            .build()
            .unwrap();

        let hinted = Failure::rate_limit("slow down", Some(Duration::from_secs(5)));
        assert_eq!(config.delay_after(0, &hinted), Duration::from_secs(5));

        let short = Failure::rate_limit("slow down", Some(Duration::from_millis(100)));
        assert_eq!(config.delay_after(1, &short), Duration::from_secs(2));

        let huge = Failure::rate_limit("slow down", Some(Duration::from_secs(600)));
        assert_eq!(config.delay_after(0, &huge), Duration::from_secs(10));

        let plain = Failure::transport("reset");
        assert_eq!(config.delay_after(0, &plain), Duration::from_secs(1));
    }

    /// Validates `RetryExecutor::execute_with_outcome` behavior for a rate
    /// limit carrying a retry-after hint.
    ///
    /// Assertions:
    /// - Confirms the executor sleeps the hinted delay on the paused clock.
    /// - Confirms the hinted delay is reported in `total_delay`.
    #[tokio::test(start_paused = true)]
    async fn test_executor_waits_for_retry_after() {
        let mut config = fast_config(2);
        config.max_delay = Duration::from_secs(30);
        let executor = RetryExecutor::new(config);
        let calls = Arc::new(AtomicU32::new(0));
        let started = tokio::time::Instant::now();

        let outcome = executor
            .execute_with_outcome(|| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(Failure::rate_limit("Too many requests", Some(Duration::from_secs(3))))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.total_delay, Duration::from_secs(3));
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(outcome.into_result().unwrap(), 7);
    }

    fn fast_config(attempts: u32) -> RetryConfig {
        RetryConfig::builder()
            .max_attempts(attempts)
            .base_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(5))
            .jitter(false)
            .build()
            .unwrap()
    }

    /// Validates `RetryConfig::validate` behavior for the invalid policy
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms zero attempts, inverted delays and sub-unit bases fail.
    #[test]
    fn test_config_validation() {
        assert!(RetryConfig::builder().max_attempts(0).build().is_err());
        assert!(RetryConfig::builder()
            .base_delay(Duration::from_secs(10))
            .max_delay(Duration::from_secs(5))
            .build()
            .is_err());
        assert!(RetryConfig::builder().exponential_base(0.5).build().is_err());
        assert!(RetryConfig::builder().exponential_base(f64::NAN).build().is_err());
        assert!(RetryConfig::default().validate().is_ok());
    }

    /// Validates `RetryConfig::base_delay_for_attempt` behavior for the
    /// capped exponential scenario.
    ///
    /// Assertions:
    /// - Confirms delays of exactly 1, 2, 4, 8, 10 seconds.
    #[test]
    fn test_backoff_sequence_is_capped() {
        let config = RetryConfig::builder()
            .base_delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(10))
            .exponential_base(2.0)
            .jitter(false)
            .build()
            .unwrap();

        let delays: Vec<_> = (0..5).map(|n| config.delay_for_attempt(n)).collect();
        let expected: Vec<_> = [1, 2, 4, 8, 10].into_iter().map(Duration::from_secs).collect();
        assert_eq!(delays, expected);
        assert_eq!(config.base_delay_for_attempt(200), Duration::from_secs(10));
    }

    /// Validates `RetryConfig::delay_for_attempt` behavior for the jitter
    /// bounds scenario.
    ///
    /// Assertions:
    /// - Confirms every jittered delay stays within ±10% of the base.
    #[test]
    fn test_jitter_within_ten_percent() {
        let config = RetryConfig::default();
        for attempt in 0..4 {
            let base = config.base_delay_for_attempt(attempt).as_secs_f64();
            for _ in 0..200 {
                let delay = config.delay_for_attempt(attempt).as_secs_f64();
                assert!(delay >= base * 0.9 - 1e-9, "{delay} below {base}");
                assert!(delay <= base * 1.1 + 1e-9, "{delay} above {base}");
            }
        }
    }

    /// Validates `RetryExecutor::execute` behavior for the non-retryable
    /// kind scenario.
    ///
    /// Assertions:
    /// - Confirms a validation failure is attempted exactly once.
    #[tokio::test]
    async fn test_non_retryable_kind_stops_immediately() {
        let executor = RetryExecutor::new(fast_config(3));
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = executor
            .execute_with_outcome(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(Failure::validation("bad", Default::default()))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.result.unwrap_err().kind(), FailureKind::Validation);
    }

    /// Validates `RetryExecutor::execute` behavior for the exhaustion
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms exactly `max_attempts` calls are made.
    /// - Confirms the returned failure is the one from the last attempt.
    #[tokio::test]
    async fn test_returns_last_failure_after_exhaustion() {
        let executor = RetryExecutor::new(fast_config(3));
        let calls = Arc::new(AtomicU32::new(0));

        let err = executor
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err::<(), _>(Failure::api(format!("attempt {n}"), Some(503)))
                }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.message(), "attempt 3");
    }

    /// Validates `RetryExecutor::execute_with_outcome` behavior for the
    /// recovery scenario.
    ///
    /// Assertions:
    /// - Confirms success on the second attempt is returned.
    /// - Confirms only one backoff was slept.
    #[tokio::test]
    async fn test_recovers_on_second_attempt() {
        let executor = RetryExecutor::new(fast_config(5));
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = executor
            .execute_with_outcome(|| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(Failure::transport("connection reset"))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.total_delay, Duration::from_millis(1));
        assert_eq!(outcome.into_result().unwrap(), "ok");
    }

    /// Validates cancellation for the pre-cancelled token scenario.
    ///
    /// Assertions:
    /// - Confirms no attempt starts once the token is cancelled.
    /// - Confirms the result is a `Cancelled` failure.
    #[tokio::test]
    async fn test_cancelled_token_prevents_attempts() {
        let token = CancellationToken::new();
        token.cancel();
        let executor = RetryExecutor::new(fast_config(3)).with_cancellation(token);

        let outcome = executor.execute_with_outcome(|| async { Ok::<u32, Failure>(1) }).await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.attempts, 0);
        assert_eq!(outcome.result.unwrap_err().kind(), FailureKind::Cancelled);
    }
}
