//! Resilient execution of calls to a remote dependency

pub mod health;
pub mod service;

pub use health::{Health, HealthStatus, RetryPolicySummary};
pub use service::{
    breaker_config, parse_kinds, retry_config, timeout_manager, ResilientExecutor,
};
