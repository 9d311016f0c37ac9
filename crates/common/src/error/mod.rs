//! Failure taxonomy and classification utilities
//!
//! Every failure that crosses a resilience primitive or the enhancement
//! pipeline is a [`Failure`]: a message, a typed [`FailureDetail`], and a
//! free-form context map. The detail is a closed tagged union, so handlers
//! match on [`FailureKind`] instead of probing error type hierarchies.
//!
//! # Error Handling Architecture
//!
//! 1. **`Failure`**: the single failure value surfaced to callers. Transport
//!    and API failures, timeouts, open circuits, and the entity-scoped domain
//!    failures produced by reclassification all share it.
//!
//! 2. **`ErrorClassification` trait**: a standard interface for classifying
//!    errors by kind, retryability, and severity. The retry executor and
//!    circuit breaker are generic over it.
//!
//! 3. **`ErrorSeverity` enum**: a unified severity level used to pick the log
//!    level of a handled failure.
//!
//! ## Retryability
//!
//! | Kind | Retryable |
//! |------|-----------|
//! | `Api` | 5xx, 408, 429 |
//! | `RateLimit` | always |
//! | `Transport` | always |
//! | everything else | never |
//!
//! The retry executor decides by kind membership alone; it consults
//! `is_retryable` for API failures only when its status gate is enabled.
//!
//! ## Examples
//!
//! ```rust
//! use sumoguard_common::error::{ErrorClassification, Failure, FailureKind};
//!
//! let failure = Failure::api("Service unavailable", Some(503))
//!     .with_request_id("req-42")
//!     .with_context("operation", "list_monitors");
//!
//! assert_eq!(failure.kind(), FailureKind::Api);
//! assert!(failure.is_retryable());
//! ```

mod failure;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

pub use failure::{
    parse_retry_after, EntityRef, FailureContext, FailureDetail, FailureKind, FailureReport,
    FieldViolation, Failure,
};

/// Standard result type using [`Failure`]
pub type FailureResult<T> = Result<T, Failure>;

/// Trait for classifying errors by their characteristics
///
/// Implemented by [`Failure`] and by any caller-defined error that wants to
/// flow through the resilience primitives.
pub trait ErrorClassification {
    /// Discriminant used for retry and breaker membership checks
    fn kind(&self) -> FailureKind;

    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again, such as server-side API errors, rate limiting, or dropped
    /// connections.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when the failing dependency advertised a
    /// delay (e.g. a `Retry-After` header).
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
///
/// Serializes to the same names as `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    #[serde(rename = "INFO")]
    Info,
    /// Warning, should be monitored but not critical
    #[serde(rename = "WARN")]
    Warning,
    /// Error, requires attention and action
    #[serde(rename = "ERROR")]
    Error,
    /// Critical, immediate action required
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
