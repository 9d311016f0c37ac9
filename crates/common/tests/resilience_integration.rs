//! Integration tests for resilience module
//!
//! Tests circuit breaker, retry and timeout primitives together with
//! various failure scenarios.

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sumoguard_common::error::{ErrorClassification, Failure, FailureKind};
use sumoguard_common::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, MockClock, RetryConfig, RetryExecutor,
    TimeoutManager,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn no_jitter(attempts: u32, base: Duration, max: Duration) -> RetryConfig {
    RetryConfig::builder()
        .max_attempts(attempts)
        .base_delay(base)
        .max_delay(max)
        .jitter(false)
        .build()
        .expect("valid retry config")
}

/// Validates retry backoff timing with a paused tokio clock.
///
/// # Test Steps
/// 1. Configure 4 attempts, base 1s, cap 3s, no jitter
/// 2. Fail every attempt with a retryable API error
/// 3. Verify the virtual time slept equals 1 + 2 + 3 seconds
#[tokio::test(start_paused = true)]
async fn test_retry_sleeps_exact_backoff() {
    let executor =
        RetryExecutor::new(no_jitter(4, Duration::from_secs(1), Duration::from_secs(3)));
    let started = Instant::now();

    let outcome = executor
        .execute_with_outcome(|| async { Err::<(), _>(Failure::api("unavailable", Some(503))) })
        .await;

    assert_eq!(outcome.attempts, 4);
    assert_eq!(outcome.total_delay, Duration::from_secs(6));
    assert_eq!(started.elapsed(), Duration::from_secs(6));
}

/// Validates that a single attempt never sleeps.
///
/// # Test Steps
/// 1. Configure `max_attempts = 1`
/// 2. Fail with a retryable error
/// 3. Verify exactly one call and zero elapsed virtual time
#[tokio::test(start_paused = true)]
async fn test_single_attempt_never_sleeps() {
    let executor =
        RetryExecutor::new(no_jitter(1, Duration::from_secs(5), Duration::from_secs(5)));
    let calls = Arc::new(AtomicU32::new(0));
    let started = Instant::now();

    let result = executor
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Failure::transport("refused"))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

/// Validates cancellation while the executor is sleeping between attempts.
///
/// # Test Steps
/// 1. Start a retry sequence with a 60s backoff
/// 2. Cancel the shutdown token while the first backoff is pending
/// 3. Verify no second attempt starts and the result is `Cancelled`
#[tokio::test(start_paused = true)]
async fn test_cancellation_during_backoff() {
    let token = CancellationToken::new();
    let executor = RetryExecutor::new(no_jitter(3, Duration::from_secs(60), Duration::from_secs(60)))
        .with_cancellation(token.clone());
    let calls = Arc::new(AtomicU32::new(0));

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
    });

    let outcome = executor
        .execute_with_outcome(|| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Failure::api("bad gateway", Some(502)))
            }
        })
        .await;
    canceller.await.expect("canceller task");

    assert!(outcome.cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.result.unwrap_err().kind(), FailureKind::Cancelled);
}

/// Validates that retry stops once the breaker inside it opens.
///
/// # Test Steps
/// 1. Wrap a breaker (threshold 2) inside a retry executor (5 attempts)
/// 2. Fail every call with a retryable error
/// 3. Verify the operation ran twice and the final failure is `CircuitOpen`
#[tokio::test(start_paused = true)]
async fn test_retry_around_breaker_stops_at_open_circuit() {
    let breaker = CircuitBreaker::with_clock(
        "sumo_api",
        CircuitBreakerConfig::builder().failure_threshold(2).build().expect("valid config"),
        MockClock::new(),
    )
    .expect("valid breaker");
    let executor =
        RetryExecutor::new(no_jitter(5, Duration::from_millis(10), Duration::from_millis(10)));
    let calls = Arc::new(AtomicU32::new(0));

    let err = executor
        .execute(|| {
            let calls = Arc::clone(&calls);
            breaker.execute(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Failure::api("unavailable", Some(503)))
            })
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(err.kind(), FailureKind::CircuitOpen);
    assert_eq!(breaker.state(), CircuitState::Open);
}

/// Validates concurrent callers sharing one breaker.
///
/// # Test Steps
/// 1. Share a breaker across 20 concurrent futures
/// 2. Succeed half, fail half with an uncounted kind
/// 3. Verify totals are exact and the breaker stays closed
#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_callers_share_state() {
    let config = CircuitBreakerConfig::builder()
        .failure_threshold(3)
        .count_only([FailureKind::Transport])
        .build()
        .expect("valid config");
    let breaker = Arc::new(CircuitBreaker::new("sumo_api", config).expect("valid breaker"));

    let tasks = (0..20).map(|i| {
        let breaker = Arc::clone(&breaker);
        async move {
            breaker
                .execute(|| async move {
                    if i % 2 == 0 {
                        Ok(i)
                    } else {
                        Err(Failure::validation("bad", Default::default()))
                    }
                })
                .await
        }
    });
    let results = futures::future::join_all(tasks).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 10);
    let stats = breaker.get_stats();
    assert_eq!(stats.total_successes, 10);
    assert_eq!(stats.total_failures, 0);
    assert_eq!(stats.state, CircuitState::Closed);
}

/// Validates timeout wrapping of a retry sequence.
///
/// # Test Steps
/// 1. Register a 5s timeout for `search_logs`
/// 2. Run a retry sequence whose backoff would take 60s
/// 3. Verify the timeout fires with the operation name
#[tokio::test(start_paused = true)]
async fn test_timeout_bounds_whole_retry_sequence() {
    let timeouts = TimeoutManager::default();
    timeouts.set_timeout("search_logs", Duration::from_secs(5)).expect("positive timeout");
    let executor =
        RetryExecutor::new(no_jitter(3, Duration::from_secs(30), Duration::from_secs(30)));

    let err = timeouts
        .execute_with_timeout(
            "search_logs",
            None,
            executor.execute(|| async { Err::<(), _>(Failure::transport("reset")) }),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Timeout);
    assert!(err.message().contains("search_logs"));
    assert!(!err.is_retryable());
}

/// Validates the synchronous breaker path from a non-async context.
///
/// # Test Steps
/// 1. Drive an async breaker call with `tokio_test::block_on`
/// 2. Verify the result passes through
#[test]
fn test_block_on_breaker_call() {
    let breaker =
        CircuitBreaker::new("sumo_api", CircuitBreakerConfig::default()).expect("valid breaker");
    let value =
        tokio_test::block_on(breaker.execute(|| async { Ok::<_, Failure>("pong") })).expect("ok");
    assert_eq!(value, "pong");
}
