//! The [`Failure`] tagged union and its supporting types.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::{ErrorClassification, ErrorSeverity};

/// Free-form key/value context attached to every failure.
pub type FailureContext = BTreeMap<String, Value>;

/// Discriminant of a [`Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Unclassified failure
    Generic,
    /// Credentials rejected or missing
    Authentication,
    /// Remote API answered with an error status
    Api,
    /// Connection-level failure, no HTTP status available
    Transport,
    /// Remote API throttled the caller (HTTP 429)
    RateLimit,
    /// Input rejected before reaching the remote API
    Validation,
    /// Deadline exceeded
    Timeout,
    /// Circuit breaker refused the call
    CircuitOpen,
    /// Shutdown requested while retrying
    Cancelled,
    /// Entity does not exist
    NotFound,
    /// Caller lacks permission for the entity operation
    PermissionDenied,
    /// Entity configuration rejected by the remote API
    ConfigurationInvalid,
    /// Entity is in a state that conflicts with the operation
    OperationConflict,
    /// Entity-scoped validation failure
    DomainValidation,
    /// Generic entity-scoped operation failure
    Operation,
}

impl FailureKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::Generic,
        Self::Authentication,
        Self::Api,
        Self::Transport,
        Self::RateLimit,
        Self::Validation,
        Self::Timeout,
        Self::CircuitOpen,
        Self::Cancelled,
        Self::NotFound,
        Self::PermissionDenied,
        Self::ConfigurationInvalid,
        Self::OperationConflict,
        Self::DomainValidation,
        Self::Operation,
    ];

    /// Stable snake_case identifier, used in statistics keys.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Authentication => "authentication",
            Self::Api => "api",
            Self::Transport => "transport",
            Self::RateLimit => "rate_limit",
            Self::Validation => "validation",
            Self::Timeout => "timeout",
            Self::CircuitOpen => "circuit_open",
            Self::Cancelled => "cancelled",
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::ConfigurationInvalid => "configuration_invalid",
            Self::OperationConflict => "operation_conflict",
            Self::DomainValidation => "domain_validation",
            Self::Operation => "operation",
        }
    }

    /// Error type name used in serialized reports.
    pub const fn error_type(self) -> &'static str {
        match self {
            Self::Generic => "GenericError",
            Self::Authentication => "AuthenticationError",
            Self::Api => "ApiError",
            Self::Transport => "TransportError",
            Self::RateLimit => "RateLimitError",
            Self::Validation => "ValidationError",
            Self::Timeout => "TimeoutError",
            Self::CircuitOpen => "CircuitOpenError",
            Self::Cancelled => "CancelledError",
            Self::NotFound => "NotFoundError",
            Self::PermissionDenied => "PermissionDeniedError",
            Self::ConfigurationInvalid => "ConfigurationInvalidError",
            Self::OperationConflict => "OperationConflictError",
            Self::DomainValidation => "DomainValidationError",
            Self::Operation => "OperationError",
        }
    }

    /// Whether this kind is produced by entity-scoped reclassification.
    pub const fn is_domain(self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::PermissionDenied
                | Self::ConfigurationInvalid
                | Self::OperationConflict
                | Self::DomainValidation
                | Self::Operation
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FailureKind {
    type Err = String;

    /// Parse a snake_case kind name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| format!("Invalid FailureKind: {s}"))
    }
}

/// Reference to the entity a domain failure is about (a monitor, a
/// dashboard, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity type, e.g. `monitor`
    pub entity_type: String,
    /// Entity identifier when known
    pub id: Option<String>,
    /// Entity display name when known
    pub name: Option<String>,
}

impl EntityRef {
    /// Create a reference with no id or name.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self { entity_type: entity_type.into(), id: None, name: None }
    }

    /// Attach an identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Serialized key for the identifier, e.g. `monitor_id`.
    pub fn id_key(&self) -> String {
        format!("{}_id", self.entity_type)
    }

    /// Serialized key for the name, e.g. `monitor_name`.
    pub fn name_key(&self) -> String {
        format!("{}_name", self.entity_type)
    }

    /// Entity type with its first letter upper-cased, for messages.
    pub fn title(&self) -> String {
        let mut chars = self.entity_type.chars();
        chars.next().map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
    }

    fn write_fields(&self, fields: &mut Map<String, Value>) {
        if let Some(id) = &self.id {
            fields.insert(self.id_key(), Value::String(id.clone()));
        }
        if let Some(name) = &self.name {
            fields.insert(self.name_key(), Value::String(name.clone()));
        }
    }
}

/// Field-level validation details shared by `Validation` and
/// `DomainValidation` failures.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Offending field
    pub field_name: Option<String>,
    /// Offending value
    pub field_value: Option<Value>,
    /// Per-field error messages
    pub validation_errors: BTreeMap<String, String>,
}

impl FieldViolation {
    /// Violation on a single field.
    pub fn field(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field_name: Some(name.into()), field_value: Some(value.into()), ..Self::default() }
    }

    /// Add a per-field message.
    #[must_use]
    pub fn with_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.validation_errors.insert(field.into(), message.into());
        self
    }

    fn write_fields(&self, fields: &mut Map<String, Value>) {
        if let Some(name) = &self.field_name {
            fields.insert("field_name".into(), Value::String(name.clone()));
        }
        if let Some(value) = &self.field_value {
            fields.insert("field_value".into(), value.clone());
        }
        if !self.validation_errors.is_empty() {
            let errors = self
                .validation_errors
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            fields.insert("validation_errors".into(), Value::Object(errors));
        }
    }
}

/// Variant-specific data of a [`Failure`].
#[derive(Debug, Clone, PartialEq)]
pub enum FailureDetail {
    /// Unclassified failure
    Generic,
    /// Credentials rejected or missing
    Authentication { auth_type: Option<String> },
    /// Remote API error status
    Api { status_code: Option<u16>, response_body: Option<String>, request_id: Option<String> },
    /// Connection-level failure
    Transport,
    /// Throttled; status code is always 429
    RateLimit { retry_after: Option<Duration>, limit_type: Option<String> },
    /// Input validation failure
    Validation(FieldViolation),
    /// Deadline exceeded
    Timeout { timeout: Duration, operation: String },
    /// Breaker refused the call
    CircuitOpen { circuit_name: String, state: String },
    /// Retry sequence stopped by shutdown
    Cancelled { operation: Option<String> },
    /// Entity does not exist
    NotFound { entity: EntityRef, operation: String },
    /// Permission denied for an entity operation
    PermissionDenied { entity: EntityRef, operation: String, required_permission: Option<String> },
    /// Entity configuration rejected
    ConfigurationInvalid {
        entity: EntityRef,
        config_section: Option<String>,
        config_errors: Vec<String>,
    },
    /// Entity state conflicts with the operation
    OperationConflict { entity: EntityRef, operation: String, entity_state: Option<String> },
    /// Entity-scoped validation failure
    DomainValidation { entity: EntityRef, violation: FieldViolation },
    /// Generic entity-scoped failure
    Operation { entity: EntityRef, operation: String },
}

impl FailureDetail {
    /// Discriminant of this detail.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Generic => FailureKind::Generic,
            Self::Authentication { .. } => FailureKind::Authentication,
            Self::Api { .. } => FailureKind::Api,
            Self::Transport => FailureKind::Transport,
            Self::RateLimit { .. } => FailureKind::RateLimit,
            Self::Validation(_) => FailureKind::Validation,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::CircuitOpen { .. } => FailureKind::CircuitOpen,
            Self::Cancelled { .. } => FailureKind::Cancelled,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::PermissionDenied { .. } => FailureKind::PermissionDenied,
            Self::ConfigurationInvalid { .. } => FailureKind::ConfigurationInvalid,
            Self::OperationConflict { .. } => FailureKind::OperationConflict,
            Self::DomainValidation { .. } => FailureKind::DomainValidation,
            Self::Operation { .. } => FailureKind::Operation,
        }
    }

    /// Entity the failure is about, for domain kinds.
    pub const fn entity(&self) -> Option<&EntityRef> {
        match self {
            Self::NotFound { entity, .. }
            | Self::PermissionDenied { entity, .. }
            | Self::ConfigurationInvalid { entity, .. }
            | Self::OperationConflict { entity, .. }
            | Self::DomainValidation { entity, .. }
            | Self::Operation { entity, .. } => Some(entity),
            _ => None,
        }
    }

    /// HTTP status associated with the failure, if any.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => *status_code,
            Self::RateLimit { .. } => Some(429),
            _ => None,
        }
    }

    fn write_fields(&self, fields: &mut Map<String, Value>) {
        if let Some(status) = self.status_code() {
            fields.insert("status_code".into(), Value::from(status));
        }
        match self {
            Self::Generic | Self::Transport => {}
            Self::Authentication { auth_type } => {
                if let Some(auth_type) = auth_type {
                    fields.insert("auth_type".into(), Value::String(auth_type.clone()));
                }
            }
            Self::Api { response_body, request_id, .. } => {
                if let Some(body) = response_body {
                    fields.insert("response_body".into(), Value::String(body.clone()));
                }
                if let Some(id) = request_id {
                    fields.insert("request_id".into(), Value::String(id.clone()));
                }
            }
            Self::RateLimit { retry_after, limit_type } => {
                if let Some(delay) = retry_after {
                    fields.insert("retry_after".into(), Value::from(delay.as_secs_f64()));
                }
                if let Some(limit_type) = limit_type {
                    fields.insert("limit_type".into(), Value::String(limit_type.clone()));
                }
            }
            Self::Validation(violation) => violation.write_fields(fields),
            Self::Timeout { timeout, operation } => {
                fields.insert("timeout_seconds".into(), Value::from(timeout.as_secs_f64()));
                fields.insert("operation".into(), Value::String(operation.clone()));
            }
            Self::CircuitOpen { circuit_name, state } => {
                fields.insert("circuit_name".into(), Value::String(circuit_name.clone()));
                fields.insert("state".into(), Value::String(state.clone()));
            }
            Self::Cancelled { operation } => {
                if let Some(operation) = operation {
                    fields.insert("operation".into(), Value::String(operation.clone()));
                }
            }
            Self::NotFound { entity, operation } | Self::Operation { entity, operation } => {
                entity.write_fields(fields);
                fields.insert("operation".into(), Value::String(operation.clone()));
            }
            Self::PermissionDenied { entity, operation, required_permission } => {
                entity.write_fields(fields);
                fields.insert("operation".into(), Value::String(operation.clone()));
                if let Some(permission) = required_permission {
                    fields.insert("required_permission".into(), Value::String(permission.clone()));
                }
            }
            Self::ConfigurationInvalid { entity, config_section, config_errors } => {
                entity.write_fields(fields);
                if let Some(section) = config_section {
                    fields.insert("config_section".into(), Value::String(section.clone()));
                }
                if !config_errors.is_empty() {
                    fields.insert(
                        "config_errors".into(),
                        Value::Array(config_errors.iter().cloned().map(Value::String).collect()),
                    );
                }
            }
            Self::OperationConflict { entity, operation, entity_state } => {
                entity.write_fields(fields);
                fields.insert("operation".into(), Value::String(operation.clone()));
                if let Some(state) = entity_state {
                    fields.insert(
                        format!("{}_state", entity.entity_type),
                        Value::String(state.clone()),
                    );
                }
            }
            Self::DomainValidation { entity, violation } => {
                entity.write_fields(fields);
                violation.write_fields(fields);
            }
        }
    }
}

/// A classified failure: message, typed detail, and context.
///
/// Construct with the kind-specific constructors, then chain the `with_*`
/// builders. Builders that do not apply to the current kind are ignored.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct Failure {
    message: String,
    detail: FailureDetail,
    context: FailureContext,
}

impl Failure {
    /// Build a failure from its parts.
    pub fn new(message: impl Into<String>, detail: FailureDetail) -> Self {
        Self { message: message.into(), detail, context: FailureContext::new() }
    }

    /// Unclassified failure.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(message, FailureDetail::Generic)
    }

    /// Authentication failure.
    pub fn authentication(message: impl Into<String>, auth_type: Option<String>) -> Self {
        Self::new(message, FailureDetail::Authentication { auth_type })
    }

    /// Remote API failure with an optional HTTP status.
    pub fn api(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::new(message, FailureDetail::Api { status_code, response_body: None, request_id: None })
    }

    /// Connection-level failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(message, FailureDetail::Transport)
    }

    /// Rate-limit failure (HTTP 429).
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::new(message, FailureDetail::RateLimit { retry_after, limit_type: None })
    }

    /// Input validation failure.
    pub fn validation(message: impl Into<String>, violation: FieldViolation) -> Self {
        Self::new(message, FailureDetail::Validation(violation))
    }

    /// Deadline exceeded for `operation`.
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        let operation = operation.into();
        Self::new(
            format!("Operation '{operation}' timed out after {:?} seconds", timeout.as_secs_f64()),
            FailureDetail::Timeout { timeout, operation },
        )
    }

    /// Breaker refused the call.
    pub fn circuit_open(circuit_name: impl Into<String>, state: impl fmt::Display) -> Self {
        let circuit_name = circuit_name.into();
        Self::new(
            format!("Circuit breaker '{circuit_name}' is {state}"),
            FailureDetail::CircuitOpen { circuit_name, state: state.to_string() },
        )
    }

    /// Retry sequence cancelled by shutdown.
    pub fn cancelled(operation: Option<String>) -> Self {
        let message = operation.as_deref().map_or_else(
            || "Operation cancelled".to_string(),
            |op| format!("Operation '{op}' cancelled"),
        );
        Self::new(message, FailureDetail::Cancelled { operation })
    }

    /// Entity not found.
    pub fn not_found(entity: EntityRef, operation: impl Into<String>) -> Self {
        let message = format!(
            "{} with ID '{}' not found",
            entity.title(),
            entity.id.as_deref().unwrap_or("unknown")
        );
        Self::new(message, FailureDetail::NotFound { entity, operation: operation.into() })
    }

    /// Permission denied for an entity operation.
    pub fn permission_denied(
        message: impl Into<String>,
        entity: EntityRef,
        operation: impl Into<String>,
    ) -> Self {
        Self::new(
            message,
            FailureDetail::PermissionDenied {
                entity,
                operation: operation.into(),
                required_permission: None,
            },
        )
    }

    /// Entity configuration rejected.
    pub fn configuration_invalid(message: impl Into<String>, entity: EntityRef) -> Self {
        Self::new(
            message,
            FailureDetail::ConfigurationInvalid {
                entity,
                config_section: None,
                config_errors: Vec::new(),
            },
        )
    }

    /// Entity state conflicts with the operation.
    pub fn operation_conflict(
        message: impl Into<String>,
        entity: EntityRef,
        operation: impl Into<String>,
        entity_state: Option<String>,
    ) -> Self {
        Self::new(
            message,
            FailureDetail::OperationConflict { entity, operation: operation.into(), entity_state },
        )
    }

    /// Entity-scoped validation failure.
    pub fn domain_validation(
        message: impl Into<String>,
        entity: EntityRef,
        violation: FieldViolation,
    ) -> Self {
        Self::new(message, FailureDetail::DomainValidation { entity, violation })
    }

    /// Generic entity-scoped failure.
    pub fn operation(
        message: impl Into<String>,
        entity: EntityRef,
        operation: impl Into<String>,
    ) -> Self {
        Self::new(message, FailureDetail::Operation { entity, operation: operation.into() })
    }

    /// Attach a context value.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attach every entry of `context`, overwriting existing keys.
    #[must_use]
    pub fn with_context_map(mut self, context: FailureContext) -> Self {
        self.merge_context(context);
        self
    }

    /// Merge `context` into this failure in place.
    pub fn merge_context(&mut self, context: FailureContext) {
        self.context.extend(context);
    }

    /// Attach the raw response body of an API failure.
    #[must_use]
    pub fn with_response_body(mut self, body: impl Into<String>) -> Self {
        if let FailureDetail::Api { response_body, .. } = &mut self.detail {
            *response_body = Some(body.into());
        }
        self
    }

    /// Attach the request id of an API failure.
    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        if let FailureDetail::Api { request_id, .. } = &mut self.detail {
            *request_id = Some(id.into());
        }
        self
    }

    /// Attach the limit type of a rate-limit failure.
    #[must_use]
    pub fn with_limit_type(mut self, kind: impl Into<String>) -> Self {
        if let FailureDetail::RateLimit { limit_type, .. } = &mut self.detail {
            *limit_type = Some(kind.into());
        }
        self
    }

    /// Attach the permission that was missing.
    #[must_use]
    pub fn with_required_permission(mut self, permission: impl Into<String>) -> Self {
        if let FailureDetail::PermissionDenied { required_permission, .. } = &mut self.detail {
            *required_permission = Some(permission.into());
        }
        self
    }

    /// Attach configuration sub-errors and the offending section.
    #[must_use]
    pub fn with_config_errors(mut self, section: Option<String>, errors: Vec<String>) -> Self {
        if let FailureDetail::ConfigurationInvalid { config_section, config_errors, .. } =
            &mut self.detail
        {
            *config_section = section;
            *config_errors = errors;
        }
        self
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Variant-specific data.
    pub const fn detail(&self) -> &FailureDetail {
        &self.detail
    }

    /// Attached context.
    pub const fn context(&self) -> &FailureContext {
        &self.context
    }

    /// HTTP status associated with the failure, if any.
    pub const fn status_code(&self) -> Option<u16> {
        self.detail.status_code()
    }

    /// Whether this is an API failure with a 4xx status.
    pub const fn is_client_error(&self) -> bool {
        matches!(self.detail, FailureDetail::Api { status_code: Some(400..=499), .. })
    }

    /// Whether this is an API failure with a 5xx status.
    pub const fn is_server_error(&self) -> bool {
        matches!(self.detail, FailureDetail::Api { status_code: Some(500..=599), .. })
    }

    /// Serializable snapshot of the failure.
    pub fn to_report(&self) -> FailureReport {
        let kind = self.kind();
        let mut details = Map::new();
        self.detail.write_fields(&mut details);
        FailureReport {
            error_type: kind.error_type(),
            kind,
            message: self.message.clone(),
            retryable: self.is_retryable(),
            severity: self.severity(),
            details,
            context: self.context.clone(),
        }
    }

    /// Key/value pairs suitable for structured logging.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sumoguard_common::error::Failure;
    ///
    /// let failure = Failure::api("Bad gateway", Some(502));
    /// let fields = failure.as_tracing_fields();
    /// assert_eq!(fields[0], ("error_type", "ApiError".to_string()));
    /// ```
    pub fn as_tracing_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("error_type", self.kind().error_type().to_string()),
            ("kind", self.kind().to_string()),
            ("message", self.message.clone()),
        ];
        if let Some(status) = self.status_code() {
            fields.push(("status_code", status.to_string()));
        }
        match &self.detail {
            FailureDetail::Timeout { operation, timeout } => {
                fields.push(("operation", operation.clone()));
                fields.push(("timeout_ms", timeout.as_millis().to_string()));
            }
            FailureDetail::CircuitOpen { circuit_name, .. } => {
                fields.push(("circuit_name", circuit_name.clone()));
            }
            _ => {}
        }
        if let Some(entity) = self.detail.entity() {
            fields.push(("entity_type", entity.entity_type.clone()));
            if let Some(id) = &entity.id {
                fields.push(("entity_id", id.clone()));
            }
        }
        fields
    }
}

impl ErrorClassification for Failure {
    fn kind(&self) -> FailureKind {
        self.detail.kind()
    }

    fn is_retryable(&self) -> bool {
        match &self.detail {
            FailureDetail::Api { status_code: Some(status), .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            FailureDetail::RateLimit { .. } | FailureDetail::Transport => true,
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match &self.detail {
            FailureDetail::NotFound { .. } | FailureDetail::Cancelled { .. } => ErrorSeverity::Info,
            FailureDetail::Api { status_code: Some(400..=499), .. }
            | FailureDetail::RateLimit { .. }
            | FailureDetail::Transport
            | FailureDetail::Validation(_)
            | FailureDetail::Timeout { .. }
            | FailureDetail::CircuitOpen { .. }
            | FailureDetail::OperationConflict { .. }
            | FailureDetail::DomainValidation { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match &self.detail {
            FailureDetail::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Serializable view of a [`Failure`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    /// Error type name, e.g. `NotFoundError`
    pub error_type: &'static str,
    /// Failure kind
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
    /// Whether the failure is transient
    pub retryable: bool,
    /// Severity level
    pub severity: ErrorSeverity,
    /// Variant fields, e.g. `status_code` or `monitor_id`
    #[serde(flatten)]
    pub details: Map<String, Value>,
    /// Attached context
    pub context: FailureContext,
}

/// Parse a `Retry-After` header value.
///
/// Accepts delta-seconds (`"30"`) or an HTTP-date
/// (`"Wed, 21 Oct 2015 07:28:00 GMT"`). Dates in the past yield a zero delay.
/// Returns `None` for values that are neither.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
