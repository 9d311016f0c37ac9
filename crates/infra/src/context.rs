//! Resilience context - wires settings, executor and handler together

use std::sync::Arc;

use sumoguard_core::{ErrorEnhancer, ResilientExecutor};
use sumoguard_domain::{ResilienceSettings, Result};

use crate::config;
use crate::observability::{init_logging, TracingErrorSink};

/// Holds the shared executor and the error handler built on it
#[derive(Debug, Clone)]
pub struct ResilienceContext {
    pub settings: ResilienceSettings,
    pub executor: Arc<ResilientExecutor>,
    pub handler: Arc<ErrorEnhancer>,
}

impl ResilienceContext {
    /// Build the context from already-loaded settings
    ///
    /// # Errors
    /// Returns `SumoguardError::Config` if the settings are invalid.
    pub fn new(settings: ResilienceSettings) -> Result<Self> {
        let executor = Arc::new(ResilientExecutor::from_settings(&settings)?);
        let handler = Arc::new(
            ErrorEnhancer::new(Arc::clone(&executor), &settings.error_handling)
                .with_sink(Arc::new(TracingErrorSink::new())),
        );

        tracing::debug!(name = %settings.name, "Resilience context created");
        Ok(Self { settings, executor, handler })
    }

    /// Load configuration, initialize logging and build the context
    ///
    /// # Errors
    /// Returns `SumoguardError::Config` if loading, logging setup or
    /// validation fails.
    pub fn bootstrap() -> Result<Self> {
        let settings = config::load()?;
        init_logging(&settings.logging)?;
        Self::new(settings)
    }
}

/// Error handler with a [`TracingErrorSink`] attached
///
/// # Errors
/// Returns `SumoguardError::Config` if the settings are invalid.
pub fn build_handler(settings: &ResilienceSettings) -> Result<ErrorEnhancer> {
    Ok(ErrorEnhancer::from_settings(settings)?.with_sink(Arc::new(TracingErrorSink::new())))
}

#[cfg(test)]
mod tests {
    use sumoguard_domain::SumoguardError;

    use super::*;

    #[test]
    fn test_context_shares_executor_with_handler() {
        let ctx = ResilienceContext::new(ResilienceSettings::default()).unwrap();
        assert!(std::ptr::eq(ctx.handler.executor(), ctx.executor.as_ref()));
        assert_eq!(ctx.executor.name(), "sumologic_api");
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut settings = ResilienceSettings::default();
        settings.circuit_breaker.failure_threshold = 0;
        assert!(matches!(ResilienceContext::new(settings.clone()), Err(SumoguardError::Config(_))));
        assert!(matches!(build_handler(&settings), Err(SumoguardError::Config(_))));
    }
}
