//! # Sumoguard Core
//!
//! Failure handling for calls to a remote dependency - no infrastructure
//! dependencies.
//!
//! This crate contains:
//! - `ResilientExecutor`: timeout, retry and circuit breaker composed for one
//!   dependency
//! - `ErrorEnhancer`: reclassification of terminal failures into entity
//!   scoped kinds, with per-operation statistics
//! - Port interfaces for failure side effects (`ErrorSink`)
//! - User-facing failure rendering
//!
//! ## Architecture Principles
//! - Only depends on `sumoguard-common` and `sumoguard-domain`
//! - No logging setup, file or environment access
//! - All external side effects via traits

pub mod executor;
pub mod handling;

pub use executor::{Health, HealthStatus, ResilientExecutor, RetryPolicySummary};
pub use handling::ports::{ErrorSink, HighErrorRate};
pub use handling::{
    log_handled_failure, render_failure, ErrorEnhancer, ErrorStatistics, ErrorStatisticsReport,
    PatternCount,
};
