//! Resilience patterns for fault tolerance
//!
//! This module provides the three primitives every remote call is wrapped in:
//! - **Circuit Breaker**: stops calling a dependency after repeated failures
//!   and probes it again after a recovery timeout
//! - **Retry Logic**: exponential backoff with optional ±10% jitter, limited
//!   to a configured set of retryable failure kinds
//! - **Timeout Manager**: per-operation deadlines with a process default
//!
//! The primitives are generic over any error implementing
//! [`ErrorClassification`](crate::error::ErrorClassification) plus the
//! conversions they need to report their own failures (`From<CircuitOpenError>`,
//! `From<RetryCancelled>`, `From<TimeoutElapsed>`). [`Failure`](crate::error::Failure)
//! implements all of them.
//!
//! Composition order (timeout outside retry outside breaker) is decided by
//! the caller; see `ResilientExecutor` in `sumoguard-core`.

pub mod circuit_breaker;
pub mod clock;
pub mod retry;
pub mod timeout;

use thiserror::Error;

/// Simple configuration error for validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A configuration value violates its constraint
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Which constraint was violated
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }
}

/// Configuration result type using simple config errors
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export circuit breaker types
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerStats,
    CircuitOpenError, CircuitState, StateTransition,
};
// Re-export clock types
pub use clock::{Clock, MockClock, SystemClock};
// Re-export retry types
pub use retry::{RetryCancelled, RetryConfig, RetryConfigBuilder, RetryExecutor, RetryOutcome};
// Re-export timeout types
pub use timeout::{TaskAborted, TimeoutElapsed, TimeoutManager};
