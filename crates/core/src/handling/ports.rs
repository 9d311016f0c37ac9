//! Port interfaces for failure handling side effects
//!
//! The enhancer reports through an [`ErrorSink`] so alerting and audit
//! adapters live outside core. Sinks are advisory: they return nothing and
//! cannot change the outcome of the call being handled.
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use sumoguard_common::error::Failure;
//! use sumoguard_core::{ErrorSink, HighErrorRate};
//!
//! struct PagerSink;
//!
//! #[async_trait]
//! impl ErrorSink for PagerSink {
//!     async fn high_error_rate(&self, signal: &HighErrorRate) {
//!         // page the on-call engineer for `signal.operation`
//!     }
//!
//!     async fn failure_handled(&self, _operation: &str, _failure: &Failure) {}
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use sumoguard_common::error::{Failure, FailureKind};

/// Raised once when an `(operation, kind)` pair reaches the error threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighErrorRate {
    /// Operation whose failures crossed the threshold
    pub operation: String,
    /// Kind of the counted failures
    pub kind: FailureKind,
    /// Count at the crossing, equal to `threshold`
    pub count: u64,
    /// Configured threshold
    pub threshold: u64,
}

/// Port receiving advisory failure signals from the enhancer
///
/// Both methods are awaited inline before `ErrorEnhancer::handle` returns,
/// so a slow sink delays the caller. Adapters doing I/O should hand the work
/// off (a channel or a spawned task) and return promptly.
#[async_trait]
pub trait ErrorSink: Send + Sync {
    /// Called exactly once per threshold crossing of a statistics key.
    async fn high_error_rate(&self, signal: &HighErrorRate);

    /// Called for every failure after reclassification.
    async fn failure_handled(&self, operation: &str, failure: &Failure);
}
