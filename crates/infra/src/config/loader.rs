//! Configuration loader
//!
//! Loads resilience settings from a config file, then layers environment
//! variables on top.
//!
//! ## Loading Strategy
//! 1. If `SUMOGUARD_CONFIG` names a file, load it (it must exist)
//! 2. Otherwise probe the standard locations; use defaults if none exists
//! 3. Apply environment overrides
//! 4. Validate the merged result
//!
//! ## Environment Variables
//! Each pair is `primary` / `legacy fallback`; empty values count as unset.
//! - `SUMOLOGIC_TIMEOUT` / `TIMEOUT`: default operation timeout in seconds
//! - `SUMOLOGIC_MAX_RETRIES` / `MAX_RETRIES`: maximum attempts per call
//! - `SUMOLOGIC_LOG_LEVEL` / `LOG_LEVEL`: log level directive
//! - `SUMOLOGIC_LOG_FORMAT` / `LOG_FORMAT`: `json` or `text`
//! - `SUMOGUARD_FAILURE_THRESHOLD`: breaker failure threshold
//! - `SUMOGUARD_RECOVERY_TIMEOUT`: breaker recovery timeout in seconds
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./sumoguard.{toml,json}` or `./config.{toml,json}` (current working
//!    directory)
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sumoguard_domain::{
    LogFormat, ResilienceSettings, Result, SumoguardError, ENV_CONFIG_PATH, ENV_FAILURE_THRESHOLD,
    ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_MAX_RETRIES, ENV_RECOVERY_TIMEOUT, ENV_TIMEOUT,
};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["sumoguard.toml", "sumoguard.json", "config.toml", "config.json"];

/// Load settings from file (if any) and environment
///
/// # Errors
/// Returns `SumoguardError::Config` if:
/// - `SUMOGUARD_CONFIG` points at a missing or unreadable file
/// - A file or environment value fails to parse
/// - The merged settings fail validation
pub fn load() -> Result<ResilienceSettings> {
    let mut settings = match non_empty_env(ENV_CONFIG_PATH) {
        Some(path) => read_file(Path::new(&path))?,
        None => match probe_config_paths() {
            Some(path) => read_file(&path)?,
            None => {
                tracing::debug!("No config file found, using defaults");
                ResilienceSettings::default()
            }
        },
    };

    apply_env_overrides(&mut settings)?;
    settings.validate()?;
    tracing::info!(
        name = %settings.name,
        max_attempts = settings.retry.max_attempts,
        failure_threshold = settings.circuit_breaker.failure_threshold,
        default_timeout_seconds = settings.timeouts.default_seconds,
        "Resilience configuration loaded"
    );
    Ok(settings)
}

/// Load defaults with environment overrides applied
///
/// # Errors
/// Returns `SumoguardError::Config` if an environment value is invalid.
pub fn load_from_env() -> Result<ResilienceSettings> {
    let mut settings = ResilienceSettings::default();
    apply_env_overrides(&mut settings)?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from a file
///
/// If `path` is `None`, probes the standard locations. The format follows
/// the file extension (`.toml` or `.json`). Environment variables are not
/// consulted.
///
/// # Errors
/// Returns `SumoguardError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or the settings fail validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ResilienceSettings> {
    let config_path = match path {
        Some(p) => p,
        None => probe_config_paths().ok_or_else(|| {
            SumoguardError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    let settings = read_file(&config_path)?;
    settings.validate()?;
    Ok(settings)
}

/// Probe the standard locations for a config file
///
/// Returns the first file that exists, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
        roots.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.is_file())
}

/// Apply environment variable overrides to `settings`
///
/// # Errors
/// Returns `SumoguardError::Config` naming the variable that failed to parse.
pub fn apply_env_overrides(settings: &mut ResilienceSettings) -> Result<()> {
    if let Some((key, value)) = env_with_fallback(ENV_TIMEOUT) {
        settings.timeouts.default_seconds = parse_env(key, &value)?;
    }
    if let Some((key, value)) = env_with_fallback(ENV_MAX_RETRIES) {
        settings.retry.max_attempts = parse_env(key, &value)?;
    }
    if let Some((_, value)) = env_with_fallback(ENV_LOG_LEVEL) {
        settings.logging.level = value.to_lowercase();
    }
    if let Some((key, value)) = env_with_fallback(ENV_LOG_FORMAT) {
        settings.logging.format = parse_env::<LogFormat>(key, &value)?;
    }
    if let Some(value) = non_empty_env(ENV_FAILURE_THRESHOLD) {
        settings.circuit_breaker.failure_threshold = parse_env(ENV_FAILURE_THRESHOLD, &value)?;
    }
    if let Some(value) = non_empty_env(ENV_RECOVERY_TIMEOUT) {
        settings.circuit_breaker.recovery_timeout_seconds =
            parse_env(ENV_RECOVERY_TIMEOUT, &value)?;
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<ResilienceSettings> {
    if !path.exists() {
        return Err(SumoguardError::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    // Unreadable but present (permissions, a directory) surfaces as `Io`.
    let contents = std::fs::read_to_string(path)?;

    parse_config(&contents, path)
}

/// Parse settings from string content
///
/// Format is detected by file extension; files without one are read as TOML.
fn parse_config(contents: &str, path: &Path) -> Result<ResilienceSettings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SumoguardError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SumoguardError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SumoguardError::Config(format!("Unsupported config format: {extension}"))),
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Primary variable first, then the legacy name
fn env_with_fallback((primary, fallback): (&'static str, &'static str)) -> Option<(&'static str, String)> {
    non_empty_env(primary)
        .map(|value| (primary, value))
        .or_else(|| non_empty_env(fallback).map(|value| (fallback, value)))
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        SumoguardError::Config(format!("Invalid value for {key}: '{value}' ({e})"))
    })
}
