//! Global subscriber setup
//!
//! Logs go to stderr so stdout stays free for the tool protocol. `RUST_LOG`,
//! when set, takes precedence over the configured level.

use sumoguard_domain::{LogFormat, LoggingSettings, Result, SumoguardError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the global subscriber
///
/// Calling this more than once is harmless: if a subscriber is already set
/// (by an earlier call or a test harness) the existing one stays in place.
///
/// # Errors
/// Returns `SumoguardError::Config` if the level directive does not parse.
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let filter = build_filter(settings)?;

    let layer = match settings.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    if tracing_subscriber::registry().with(layer).try_init().is_err() {
        tracing::debug!("Global tracing subscriber already initialized");
        return Ok(());
    }

    tracing::info!(level = %settings.level, format = %settings.format, "Logging initialized");
    Ok(())
}

/// Filter from `RUST_LOG`, falling back to the configured level
///
/// # Errors
/// Returns `SumoguardError::Config` if the configured level does not parse.
pub fn build_filter(settings: &LoggingSettings) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.level).map_err(|e| {
        SumoguardError::Config(format!("Invalid log level '{}': {e}", settings.level))
    })
}
