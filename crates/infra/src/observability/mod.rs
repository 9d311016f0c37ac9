//! Observability infrastructure
//!
//! - [`init_logging`] installs the global `tracing` subscriber from
//!   `LoggingSettings`
//! - [`TracingErrorSink`] reports handled failures and high-error-rate
//!   signals as `tracing` events on the [`ALERT_TARGET`] target

pub mod logging;
pub mod sink;

pub use logging::{build_filter, init_logging};
pub use sink::{TracingErrorSink, ALERT_TARGET};
