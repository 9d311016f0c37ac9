//! # Sumoguard Infrastructure
//!
//! Infrastructure around the resilience core.
//!
//! This crate contains:
//! - Configuration loading (files and environment variables)
//! - Logging initialization (`tracing-subscriber`)
//! - The `tracing`-backed `ErrorSink` adapter
//! - Context wiring for tool handlers
//!
//! ## Architecture
//! - Implements ports defined in `sumoguard-core`
//! - Depends on `sumoguard-domain` and `sumoguard-core`
//! - Contains all "impure" code (environment, filesystem, global subscriber)

pub mod config;
pub mod context;
pub mod observability;

// Re-export commonly used items
pub use context::{build_handler, ResilienceContext};
pub use observability::{init_logging, TracingErrorSink};
