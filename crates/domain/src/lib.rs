//! # Sumoguard Domain
//!
//! Plain data shared by every Sumoguard crate.
//!
//! This crate contains:
//! - Resilience settings (retry, circuit breaker, timeouts, error handling)
//! - Per-call operation context
//! - Setup error types and Result definitions
//! - Defaults and environment variable names
//!
//! ## Architecture
//! - No dependencies on other Sumoguard crates
//! - Only serialization and error derives as external dependencies

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use constants::*;
pub use errors::*;
pub use types::*;
