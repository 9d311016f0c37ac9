//! `ErrorSink` adapter backed by `tracing`

use async_trait::async_trait;
use sumoguard_common::error::{ErrorClassification, Failure};
use sumoguard_core::{ErrorSink, HighErrorRate};

/// Target for alert events, so subscribers can route them separately
pub const ALERT_TARGET: &str = "sumoguard::alerts";

/// Emits `warn!` per high-error-rate signal and `debug!` per handled failure
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl TracingErrorSink {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ErrorSink for TracingErrorSink {
    async fn high_error_rate(&self, signal: &HighErrorRate) {
        tracing::warn!(
            target: ALERT_TARGET,
            operation = %signal.operation,
            kind = %signal.kind,
            count = signal.count,
            threshold = signal.threshold,
            "High error rate detected"
        );
    }

    async fn failure_handled(&self, operation: &str, failure: &Failure) {
        match serde_json::to_string(&failure.to_report()) {
            Ok(report) => tracing::debug!(
                target: ALERT_TARGET,
                operation,
                kind = %failure.kind(),
                report = %report,
                "Failure handled"
            ),
            Err(e) => tracing::debug!(
                target: ALERT_TARGET,
                operation,
                error = %e,
                "Failed to serialize failure report"
            ),
        }
    }
}
