//! Integration tests for the failure taxonomy
//!
//! Exercises classification, serialization and context handling through the
//! public API only.

#![cfg(feature = "foundation")]

use std::time::Duration;

use serde_json::json;
use sumoguard_common::error::{
    EntityRef, ErrorClassification, ErrorSeverity, Failure, FailureContext, FailureKind,
    FieldViolation,
};

/// Tests that every kind reports a stable snake_case name and error type.
///
/// Verifies:
/// - `as_str` values are unique
/// - Serialized kinds match `as_str`
#[test]
fn test_kind_names_are_stable_and_unique() {
    let mut names: Vec<_> = FailureKind::ALL.iter().map(|k| k.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), FailureKind::ALL.len());

    for kind in FailureKind::ALL {
        assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        assert!(kind.error_type().ends_with("Error"));
    }
}

/// Tests the serialized report of an API failure.
///
/// Verifies:
/// - Status code, request id and body appear at the top level
/// - Retryability and severity are reported
#[test]
fn test_api_failure_report() {
    let failure = Failure::api("Internal error", Some(500))
        .with_request_id("req-1")
        .with_response_body("{\"message\":\"oops\"}")
        .with_context("operation", "list_collectors");

    let report = serde_json::to_value(failure.to_report()).unwrap();

    assert_eq!(report["error_type"], "ApiError");
    assert_eq!(report["status_code"], 500);
    assert_eq!(report["request_id"], "req-1");
    assert_eq!(report["retryable"], true);
    assert_eq!(report["severity"], "ERROR");
    assert_eq!(report["context"]["operation"], "list_collectors");
}

/// Tests domain failures carry entity-specific keys and severities.
///
/// Verifies:
/// - Conflict state is reported as `<entity>_state`
/// - Domain failures are never retryable
#[test]
fn test_domain_failure_reports() {
    let entity = EntityRef::new("monitor").with_id("m-9").with_name("CPU high");
    let conflict = Failure::operation_conflict(
        "Monitor operation conflict in update_monitor: already disabled",
        entity.clone(),
        "update_monitor",
        Some("disabled".to_string()),
    );
    let report = serde_json::to_value(conflict.to_report()).unwrap();
    assert_eq!(report["monitor_id"], "m-9");
    assert_eq!(report["monitor_name"], "CPU high");
    assert_eq!(report["monitor_state"], "disabled");
    assert_eq!(conflict.severity(), ErrorSeverity::Warning);

    let invalid = Failure::configuration_invalid("bad config", entity.clone()).with_config_errors(
        Some("trigger_conditions".to_string()),
        vec!["threshold must be positive".to_string()],
    );
    let report = serde_json::to_value(invalid.to_report()).unwrap();
    assert_eq!(report["config_section"], "trigger_conditions");
    assert_eq!(report["config_errors"][0], "threshold must be positive");

    let validation = Failure::domain_validation(
        "Monitor validation failed",
        entity,
        FieldViolation::field("name", "").with_error("name", "must not be empty"),
    );
    let report = serde_json::to_value(validation.to_report()).unwrap();
    assert_eq!(report["field_name"], "name");
    assert_eq!(report["validation_errors"]["name"], "must not be empty");

    for failure in [conflict, invalid, validation] {
        assert!(failure.kind().is_domain());
        assert!(!failure.is_retryable());
    }
}

/// Tests context merging semantics.
///
/// Verifies:
/// - Merged keys overwrite existing ones
/// - Untouched keys survive
#[test]
fn test_context_merge_overwrites() {
    let mut failure = Failure::rate_limit("throttled", Some(Duration::from_secs(5)))
        .with_context("operation", "search_logs")
        .with_context("attempt", 1);

    let mut extra = FailureContext::new();
    extra.insert("attempt".to_string(), json!(3));
    extra.insert("execution_time_ms".to_string(), json!(812.4));
    failure.merge_context(extra);

    assert_eq!(failure.context()["attempt"], 3);
    assert_eq!(failure.context()["operation"], "search_logs");
    assert_eq!(failure.context().len(), 3);
    assert_eq!(failure.kind(), FailureKind::RateLimit);
}

/// Tests that failures render their message through `Display`.
///
/// Verifies:
/// - `to_string` equals `message`
/// - Failures box as `std::error::Error`
#[test]
fn test_display_and_error_trait() {
    let failure = Failure::authentication("Invalid access key", Some("access_key".to_string()));
    assert_eq!(failure.to_string(), "Invalid access key");

    let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(failure);
    assert_eq!(boxed.to_string(), "Invalid access key");
}
