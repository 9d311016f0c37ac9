//! User-facing failure messages
//!
//! Tool handlers return these strings to the client verbatim, so each kind
//! gets a heading, the details a user can act on, and a remediation hint.

use std::fmt::Write as _;
use std::time::Duration;

use sumoguard_common::error::{EntityRef, ErrorClassification, Failure, FailureDetail, FieldViolation};

/// Render `failure` for a client of `tool_name`
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use sumoguard_common::error::Failure;
/// use sumoguard_core::render_failure;
///
/// let failure = Failure::rate_limit("Too many requests", Some(Duration::from_secs(30)));
/// assert_eq!(
///     render_failure("search_logs", &failure),
///     "Rate Limit Error in search_logs: Too many requests\n\
///      Retry after: 30 seconds\n\
///      Please wait before making additional requests."
/// );
/// ```
pub fn render_failure(tool_name: &str, failure: &Failure) -> String {
    let message = failure.message();
    let mut out = String::new();

    match failure.detail() {
        FailureDetail::Validation(violation) => {
            let _ = write!(out, "Validation Error in {tool_name}: {message}");
            push_violation(&mut out, violation);
        }
        FailureDetail::DomainValidation { entity, violation } => {
            let _ = write!(out, "Validation Error in {tool_name}: {message}");
            push_entity(&mut out, entity);
            push_violation(&mut out, violation);
        }
        FailureDetail::Authentication { auth_type } => {
            let _ = write!(out, "Authentication Error in {tool_name}: {message}");
            if let Some(auth_type) = auth_type {
                let _ = write!(out, "\nAuthentication Type: {auth_type}");
            }
            out.push_str("\nPlease check your Sumo Logic credentials and try again.");
        }
        FailureDetail::RateLimit { retry_after, limit_type } => {
            let _ = write!(out, "Rate Limit Error in {tool_name}: {message}");
            if let Some(delay) = retry_after {
                let _ = write!(out, "\nRetry after: {} seconds", seconds(*delay));
            }
            if let Some(limit_type) = limit_type {
                let _ = write!(out, "\nLimit Type: {limit_type}");
            }
            out.push_str("\nPlease wait before making additional requests.");
        }
        FailureDetail::Api { status_code, request_id, .. } => {
            let _ = write!(out, "API Error in {tool_name}: {message}");
            if let Some(status) = status_code {
                let _ = write!(out, "\nHTTP Status: {status}");
            }
            if let Some(id) = request_id {
                let _ = write!(out, "\nRequest ID: {id}");
            }
            if failure.is_retryable() {
                out.push_str("\nThis error may be temporary. Please try again.");
            }
        }
        FailureDetail::Transport => {
            let _ = write!(out, "Connection Error in {tool_name}: {message}");
            out.push_str("\nThis error may be temporary. Please try again.");
        }
        FailureDetail::Timeout { timeout, operation } => {
            let _ = write!(out, "Timeout Error in {tool_name}: {message}");
            let _ = write!(out, "\nTimeout: {} seconds", seconds(*timeout));
            let _ = write!(out, "\nOperation: {operation}");
            out.push_str("\nConsider reducing the scope of your request or try again later.");
        }
        FailureDetail::CircuitOpen { circuit_name, .. } => {
            let _ = write!(out, "Service Unavailable in {tool_name}: {message}");
            let _ = write!(out, "\nCircuit: {circuit_name}");
            out.push_str("\nThe service is failing repeatedly. Please try again later.");
        }
        FailureDetail::Cancelled { .. } => {
            let _ = write!(out, "Cancelled in {tool_name}: {message}");
        }
        FailureDetail::NotFound { entity, .. } => {
            let _ = write!(out, "Not Found in {tool_name}: {message}");
            push_entity(&mut out, entity);
        }
        FailureDetail::PermissionDenied { entity, operation, required_permission } => {
            let _ = write!(out, "Permission Error in {tool_name}: {message}");
            push_entity(&mut out, entity);
            let _ = write!(out, "\nOperation: {operation}");
            if let Some(permission) = required_permission {
                let _ = write!(out, "\nRequired Permission: {permission}");
            }
            out.push_str("\nPlease check that your access key has the required capabilities.");
        }
        FailureDetail::ConfigurationInvalid { entity, config_section, config_errors } => {
            let _ = write!(out, "Configuration Error in {tool_name}: {message}");
            push_entity(&mut out, entity);
            if let Some(section) = config_section {
                let _ = write!(out, "\nConfiguration Section: {section}");
            }
            if !config_errors.is_empty() {
                out.push_str("\nConfiguration Details:");
                for detail in config_errors {
                    let _ = write!(out, "\n  - {detail}");
                }
            }
            let _ = write!(out, "\nPlease review the {} configuration and try again.", entity.entity_type);
        }
        FailureDetail::OperationConflict { entity, entity_state, .. } => {
            let _ = write!(out, "Operation Conflict in {tool_name}: {message}");
            push_entity(&mut out, entity);
            if let Some(state) = entity_state {
                let _ = write!(out, "\n{} State: {state}", entity.title());
            }
        }
        FailureDetail::Operation { entity, .. } => {
            let _ = write!(out, "Sumo Logic Error in {tool_name}: {message}");
            push_entity(&mut out, entity);
            if !failure.context().is_empty() {
                if let Ok(context) = serde_json::to_string(failure.context()) {
                    let _ = write!(out, "\nContext: {context}");
                }
            }
        }
        FailureDetail::Generic => {
            let _ = write!(out, "Unexpected Error in {tool_name}: {message}");
            let _ = write!(out, "\nError Type: {}", failure.kind().error_type());
            out.push_str("\nThis is an unexpected error. Please report this issue.");
        }
    }
    out
}

fn push_violation(out: &mut String, violation: &FieldViolation) {
    if let Some(field) = &violation.field_name {
        let _ = write!(out, "\nField: {field}");
    }
    if !violation.validation_errors.is_empty() {
        out.push_str("\nValidation Details:");
        for (field, error) in &violation.validation_errors {
            let _ = write!(out, "\n  - {field}: {error}");
        }
    }
}

fn push_entity(out: &mut String, entity: &EntityRef) {
    if let Some(id) = &entity.id {
        let _ = write!(out, "\n{} ID: {id}", entity.title());
    }
    if let Some(name) = &entity.name {
        let _ = write!(out, "\n{} Name: {name}", entity.title());
    }
}

/// Whole seconds print without a fraction
fn seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{}", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use sumoguard_common::error::FieldViolation;

    use super::*;

    #[test]
    fn test_api_failure_mentions_status_and_hint() {
        let failure = Failure::api("Service unavailable", Some(503)).with_request_id("req-7");
        assert_eq!(
            render_failure("list_monitors", &failure),
            "API Error in list_monitors: Service unavailable\nHTTP Status: 503\nRequest ID: req-7\n\
             This error may be temporary. Please try again."
        );

        let client = render_failure("list_monitors", &Failure::api("Bad request", Some(400)));
        assert!(!client.contains("temporary"));
    }

    #[test]
    fn test_timeout_lists_deadline_and_operation() {
        let failure = Failure::timeout("search_logs", Duration::from_millis(2500));
        let text = render_failure("search_logs", &failure);
        assert!(text.starts_with("Timeout Error in search_logs: Operation 'search_logs' timed out"));
        assert!(text.contains("\nTimeout: 2.5 seconds\nOperation: search_logs\n"));
    }

    #[test]
    fn test_domain_failures_show_entity() {
        let entity = EntityRef::new("monitor").with_id("abc123");
        let not_found = Failure::not_found(entity.clone(), "get_monitor");
        assert_eq!(
            render_failure("get_monitor", &not_found),
            "Not Found in get_monitor: Monitor with ID 'abc123' not found\nMonitor ID: abc123"
        );

        let validation = Failure::domain_validation(
            "Monitor validation failed",
            entity,
            FieldViolation::field("limit", 5000).with_error("limit", "must be <= 1000"),
        );
        let text = render_failure("list_monitors", &validation);
        assert!(text.contains("\nField: limit\nValidation Details:\n  - limit: must be <= 1000"));
    }

    #[test]
    fn test_generic_failure_asks_for_report() {
        let text = render_failure("search_logs", &Failure::generic("boom"));
        assert!(text.ends_with("Error Type: GenericError\nThis is an unexpected error. Please report this issue."));
    }
}
