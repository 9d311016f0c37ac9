//! Domain constants
//!
//! Centralized defaults for the resilience layer and the environment
//! variable names the configuration loader reads.

// Retry defaults
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY_SECONDS: f64 = 1.0;
pub const DEFAULT_MAX_DELAY_SECONDS: f64 = 60.0;
pub const DEFAULT_EXPONENTIAL_BASE: f64 = 2.0;

// Circuit breaker defaults
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_RECOVERY_TIMEOUT_SECONDS: f64 = 60.0;
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 3;
pub const DEFAULT_STATE_HISTORY_LIMIT: usize = 10;

// Timeout defaults
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 30.0;

/// Per-operation deadlines for monitor tool handlers, in seconds.
pub const MONITOR_OPERATION_TIMEOUTS: [(&str, f64); 11] = [
    ("list_monitors", 30.0),
    ("get_monitor", 15.0),
    ("create_monitor", 45.0),
    ("update_monitor", 30.0),
    ("delete_monitor", 20.0),
    ("get_monitor_status", 25.0),
    ("get_active_alerts", 20.0),
    ("enable_monitor", 15.0),
    ("disable_monitor", 15.0),
    ("validate_monitor_config", 10.0),
    ("get_monitor_history", 60.0),
];

// Error handling defaults
pub const DEFAULT_ENTITY_TYPE: &str = "monitor";
pub const DEFAULT_HIGH_ERROR_THRESHOLD: u64 = 5;
pub const DEFAULT_RECENT_WINDOW_SECONDS: u64 = 300;
pub const DEFAULT_EXECUTOR_NAME: &str = "sumologic_api";

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Environment variables (primary name, legacy fallback)
pub const ENV_TIMEOUT: (&str, &str) = ("SUMOLOGIC_TIMEOUT", "TIMEOUT");
pub const ENV_MAX_RETRIES: (&str, &str) = ("SUMOLOGIC_MAX_RETRIES", "MAX_RETRIES");
pub const ENV_LOG_LEVEL: (&str, &str) = ("SUMOLOGIC_LOG_LEVEL", "LOG_LEVEL");
pub const ENV_LOG_FORMAT: (&str, &str) = ("SUMOLOGIC_LOG_FORMAT", "LOG_FORMAT");
pub const ENV_FAILURE_THRESHOLD: &str = "SUMOGUARD_FAILURE_THRESHOLD";
pub const ENV_RECOVERY_TIMEOUT: &str = "SUMOGUARD_RECOVERY_TIMEOUT";
pub const ENV_CONFIG_PATH: &str = "SUMOGUARD_CONFIG";
