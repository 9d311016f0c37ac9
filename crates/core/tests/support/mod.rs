//! Shared test helpers for `sumoguard-core` integration tests.
//!
//! These helpers provide a recording sink and enhancer fixtures so that
//! tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sumoguard_common::error::{Failure, FailureKind};
use sumoguard_common::resilience::MockClock;
use sumoguard_core::{ErrorEnhancer, ErrorSink, HighErrorRate, ResilientExecutor};
use sumoguard_domain::ResilienceSettings;

/// In-memory `ErrorSink` that records every call.
#[derive(Default)]
pub struct RecordingSink {
    signals: Mutex<Vec<HighErrorRate>>,
    handled: Mutex<Vec<(String, FailureKind)>>,
}

impl RecordingSink {
    pub fn signals(&self) -> Vec<HighErrorRate> {
        self.signals.lock().clone()
    }

    pub fn handled(&self) -> Vec<(String, FailureKind)> {
        self.handled.lock().clone()
    }
}

#[async_trait]
impl ErrorSink for RecordingSink {
    async fn high_error_rate(&self, signal: &HighErrorRate) {
        self.signals.lock().push(signal.clone());
    }

    async fn failure_handled(&self, operation: &str, failure: &Failure) {
        use sumoguard_common::error::ErrorClassification;
        self.handled.lock().push((operation.to_string(), failure.kind()));
    }
}

/// Settings with fast, deterministic retries and a generous breaker.
pub fn fast_settings() -> ResilienceSettings {
    let mut settings = ResilienceSettings::default();
    settings.retry.base_delay_seconds = 0.01;
    settings.retry.max_delay_seconds = 0.05;
    settings.retry.jitter = false;
    settings.circuit_breaker.failure_threshold = 50;
    settings
}

/// Enhancer on a mock clock, wired to a fresh recording sink.
pub fn enhancer_with_sink(
    settings: &ResilienceSettings,
) -> (ErrorEnhancer<MockClock>, Arc<RecordingSink>, MockClock) {
    let clock = MockClock::new();
    let executor = ResilientExecutor::from_settings_with_clock(settings, clock.clone())
        .expect("valid test settings");
    let sink = Arc::new(RecordingSink::default());
    let enhancer = ErrorEnhancer::with_clock(Arc::new(executor), &settings.error_handling, clock.clone())
        .with_sink(sink.clone());
    (enhancer, sink, clock)
}

/// Convenience for advancing past the recent-statistics window.
pub const PAST_RECENT_WINDOW: Duration = Duration::from_secs(301);
