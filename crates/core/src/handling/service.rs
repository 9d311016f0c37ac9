//! Error enhancement service - reclassifies failures for one entity type

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use sumoguard_common::error::{
    EntityRef, ErrorClassification, Failure, FailureContext, FailureDetail, FailureKind,
};
use sumoguard_common::resilience::{Clock, SystemClock};
use sumoguard_domain::{ErrorHandlingSettings, OperationContext, ResilienceSettings, Result};
use tracing::{debug, error, info, warn};

use super::ports::ErrorSink;
use super::statistics::{ErrorStatistics, PatternCount};
use crate::executor::{HealthStatus, ResilientExecutor};

/// Fragments (matched case-insensitively) that mark a 400 as a
/// configuration problem with the entity rather than a malformed request.
const CONFIGURATION_TRIGGERS: [&str; 2] = ["configuration", "invalid"];

/// Snapshot returned by [`ErrorEnhancer::get_error_statistics`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorStatisticsReport {
    /// Distinct `"{operation}:{kind}"` keys
    pub total_error_types: usize,
    /// Failures counted since the last reset
    pub total_errors: u64,
    /// Keys seen within the recent window
    pub recent_errors: BTreeMap<String, PatternCount>,
    /// Lifetime count per `"{operation}:{kind}"` key
    pub error_patterns: BTreeMap<String, u64>,
    /// Health of the shared executor
    pub circuit_breaker_status: HealthStatus,
}

/// Runs operations through a [`ResilientExecutor`] and turns terminal
/// failures into entity-scoped ones
///
/// On failure the enhancer attaches call context (operation, timing, entity
/// identity, caller extras), reclassifies transport-level failures into
/// domain kinds, counts the result, and reports it to the optional
/// [`ErrorSink`]. Successful results pass through untouched.
pub struct ErrorEnhancer<C: Clock = SystemClock> {
    executor: Arc<ResilientExecutor<C>>,
    entity_type: String,
    scoped_operations: BTreeSet<String>,
    recent_window: Duration,
    statistics: ErrorStatistics<C>,
    sink: Option<Arc<dyn ErrorSink>>,
    clock: C,
}

impl<C: Clock> std::fmt::Debug for ErrorEnhancer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorEnhancer")
            .field("executor", &self.executor.name())
            .field("entity_type", &self.entity_type)
            .field("scoped_operations", &self.scoped_operations)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl ErrorEnhancer<SystemClock> {
    pub fn new(executor: Arc<ResilientExecutor>, settings: &ErrorHandlingSettings) -> Self {
        Self::with_clock(executor, settings, SystemClock)
    }

    /// Build the executor and the enhancer from loaded settings
    ///
    /// # Errors
    /// Returns `SumoguardError::Config` if the settings are invalid.
    pub fn from_settings(settings: &ResilienceSettings) -> Result<Self> {
        let executor = ResilientExecutor::from_settings(settings)?;
        Ok(Self::new(Arc::new(executor), &settings.error_handling))
    }
}

impl<C: Clock + Clone> ErrorEnhancer<C> {
    /// Enhancer whose timestamps and statistics window read `clock`
    pub fn with_clock(
        executor: Arc<ResilientExecutor<C>>,
        settings: &ErrorHandlingSettings,
        clock: C,
    ) -> Self {
        Self {
            executor,
            entity_type: settings.entity_type.clone(),
            scoped_operations: settings.scoped_operations().into_iter().collect(),
            recent_window: settings.recent_window(),
            statistics: ErrorStatistics::with_clock(settings.high_error_threshold, clock.clone()),
            sink: None,
            clock,
        }
    }
}

impl<C: Clock> ErrorEnhancer<C> {
    /// Report handled failures and threshold crossings to `sink`
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn executor(&self) -> &ResilientExecutor<C> {
        &self.executor
    }

    pub const fn statistics(&self) -> &ErrorStatistics<C> {
        &self.statistics
    }

    /// Run `operation` with resilience and enhance any terminal failure
    ///
    /// The deadline is `context.timeout_override` when set. Statistics,
    /// sink reports and logging never alter the returned result.
    pub async fn handle<F, Fut, T>(
        &self,
        operation_name: &str,
        context: OperationContext,
        operation: F,
    ) -> std::result::Result<T, Failure>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, Failure>>,
    {
        let started = self.clock.now();
        debug!(
            operation = operation_name,
            entity_id = context.entity_id.as_deref(),
            entity_name = context.entity_name.as_deref(),
            "Starting operation"
        );

        let result =
            self.executor.execute(operation_name, context.timeout_override, operation).await;
        let execution_time_ms = millis(self.clock.now().saturating_duration_since(started));

        match result {
            Ok(value) => {
                info!(
                    operation = operation_name,
                    entity_id = context.entity_id.as_deref(),
                    execution_time_ms,
                    "Operation completed successfully"
                );
                Ok(value)
            }
            Err(failure) => {
                let mut enhanced = self.enhance(operation_name, &context, failure);
                enhanced.merge_context(FailureContext::from([(
                    "execution_time_ms".to_string(),
                    Value::from(execution_time_ms),
                )]));
                self.track(operation_name, &enhanced).await;
                log_handled_failure(operation_name, &enhanced, execution_time_ms);
                Err(enhanced)
            }
        }
    }

    /// Attach call context to `failure` and reclassify it
    ///
    /// Does not count or report the result; [`Self::handle`] does both.
    pub fn enhance(
        &self,
        operation_name: &str,
        context: &OperationContext,
        failure: Failure,
    ) -> Failure {
        let entity = self.entity_ref(context);
        let call_context = self.call_context(operation_name, context, &entity);
        let kind = failure.kind();

        let mut enhanced = match failure.detail() {
            FailureDetail::Api { status_code: Some(404), .. }
                if entity.id.is_some() && self.scoped_operations.contains(operation_name) =>
            {
                Failure::not_found(entity, operation_name)
            }
            FailureDetail::Api { status_code: Some(403), .. } => Failure::permission_denied(
                format!("Insufficient permissions for {} {operation_name}", self.entity_type),
                entity,
                operation_name,
            ),
            FailureDetail::Api { status_code: Some(400), response_body, .. }
                if mentions_configuration(failure.message(), response_body.as_deref()) =>
            {
                Failure::configuration_invalid(
                    format!(
                        "Invalid {} configuration in {operation_name}: {}",
                        self.entity_type,
                        failure.message()
                    ),
                    entity,
                )
                .with_config_errors(None, config_sub_errors(response_body.as_deref()))
            }
            FailureDetail::Api { status_code: Some(409), .. } => Failure::operation_conflict(
                format!("{} operation conflict in {operation_name}: {}", entity.title(), failure.message()),
                entity,
                operation_name,
                context.entity_state.clone(),
            ),
            FailureDetail::Validation(violation) => Failure::domain_validation(
                format!("{} validation failed in {operation_name}: {}", entity.title(), failure.message()),
                entity,
                violation.clone(),
            ),
            FailureDetail::Api { .. }
            | FailureDetail::Timeout { .. }
            | FailureDetail::RateLimit { .. } => failure.clone(),
            _ if kind.is_domain() => failure.clone(),
            _ => Failure::operation(
                format!("Unexpected error in {operation_name}: {}", failure.message()),
                entity,
                operation_name,
            )
            .with_context("original_error_type", kind.error_type())
            .with_context("original_error", failure.message()),
        };

        if enhanced.kind() != kind {
            enhanced.merge_context(failure.context().clone());
        }
        enhanced.merge_context(call_context);
        enhanced
    }

    /// Statistics report including the executor's health
    pub fn get_error_statistics(&self) -> ErrorStatisticsReport {
        ErrorStatisticsReport {
            total_error_types: self.statistics.total_error_types(),
            total_errors: self.statistics.total_errors(),
            recent_errors: self.statistics.recent(self.recent_window),
            error_patterns: self.statistics.patterns(),
            circuit_breaker_status: self.executor.get_health(),
        }
    }

    /// Clear all failure counters
    pub fn reset_error_statistics(&self) {
        self.statistics.reset();
        info!(entity_type = %self.entity_type, "Reset error statistics");
    }

    /// Count the failure and notify the sink; the sink is awaited inline.
    async fn track(&self, operation_name: &str, failure: &Failure) {
        let signal = self.statistics.record(operation_name, failure.kind());
        if let Some(signal) = &signal {
            warn!(
                operation = %signal.operation,
                kind = %signal.kind,
                error_count = signal.count,
                "High error rate detected"
            );
        }
        if let Some(sink) = &self.sink {
            if let Some(signal) = &signal {
                sink.high_error_rate(signal).await;
            }
            sink.failure_handled(operation_name, failure).await;
        }
    }

    fn entity_ref(&self, context: &OperationContext) -> EntityRef {
        let mut entity = EntityRef::new(self.entity_type.as_str());
        if let Some(id) = &context.entity_id {
            entity = entity.with_id(id.as_str());
        }
        if let Some(name) = &context.entity_name {
            entity = entity.with_name(name.as_str());
        }
        entity
    }

    fn call_context(
        &self,
        operation_name: &str,
        context: &OperationContext,
        entity: &EntityRef,
    ) -> FailureContext {
        let mut map = context.extra.clone();
        map.insert("operation".to_string(), Value::from(operation_name));
        map.insert("timestamp".to_string(), Value::from(self.clock.utc_now().to_rfc3339()));
        if let Some(id) = &entity.id {
            map.insert(entity.id_key(), Value::from(id.as_str()));
        }
        if let Some(name) = &entity.name {
            map.insert(entity.name_key(), Value::from(name.as_str()));
        }
        map
    }
}

/// Log a handled failure at the level its kind warrants
pub fn log_handled_failure(operation: &str, failure: &Failure, execution_time_ms: f64) {
    let kind = failure.kind();
    let error_type = kind.error_type();
    let error_message = failure.message();
    let status_code = failure.status_code();
    let entity_id = failure.detail().entity().and_then(|e| e.id.as_deref());

    macro_rules! emit {
        ($level:ident, $msg:literal) => {
            $level!(
                operation,
                error_type,
                error_message,
                execution_time_ms,
                status_code,
                entity_id,
                $msg
            )
        };
    }

    match kind {
        FailureKind::Validation | FailureKind::DomainValidation => emit!(warn, "Validation error"),
        FailureKind::NotFound => emit!(warn, "Entity not found"),
        FailureKind::PermissionDenied => emit!(error, "Permission denied"),
        FailureKind::ConfigurationInvalid => emit!(error, "Configuration error"),
        FailureKind::RateLimit => emit!(warn, "Operation rate limited"),
        FailureKind::Timeout => emit!(error, "Operation timeout"),
        FailureKind::Api if failure.is_client_error() => emit!(warn, "API client error"),
        FailureKind::Api => emit!(error, "API server error"),
        FailureKind::Cancelled => emit!(info, "Operation cancelled"),
        _ => emit!(error, "Operation error"),
    }
}

fn mentions_configuration(message: &str, body: Option<&str>) -> bool {
    [Some(message), body].into_iter().flatten().any(|text| {
        let text = text.to_lowercase();
        CONFIGURATION_TRIGGERS.iter().any(|trigger| text.contains(trigger))
    })
}

/// Sub-errors from a JSON body of the form `{"errors": [...]}`
///
/// Entries may be strings or objects with a `message` field; anything else
/// is skipped.
fn config_sub_errors(body: Option<&str>) -> Vec<String> {
    let Some(Ok(value)) = body.map(serde_json::from_str::<Value>) else {
        return Vec::new();
    };
    value
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|entry| match entry {
                    Value::String(text) => Some(text.clone()),
                    Value::Object(fields) => {
                        fields.get("message").and_then(Value::as_str).map(str::to_string)
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}
