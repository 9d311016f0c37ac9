//! Failure taxonomy and resilience primitives shared across Sumoguard crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: the [`error`] taxonomy (`Failure`, `FailureKind`,
//!   `ErrorClassification`) with no async runtime and no logging
//! - `runtime`: async [`resilience`] primitives (circuit breaker, retry
//!   executor, timeout manager) on tokio, with tracing
//! - `observability`: tracing without the async runtime

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{
    ErrorClassification, ErrorSeverity, EntityRef, Failure, FailureContext, FailureDetail,
    FailureKind, FailureReport, FailureResult, FieldViolation,
};
#[cfg(feature = "runtime")]
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitOpenError, CircuitState,
    Clock, ConfigError, MockClock, RetryConfig, RetryExecutor, SystemClock, TimeoutElapsed,
    TimeoutManager,
};
