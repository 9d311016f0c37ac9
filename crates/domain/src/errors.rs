//! Error types used throughout the workspace

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Sumoguard setup and wiring
///
/// Failures of guarded operations are reported as `Failure` values from
/// `sumoguard-common`; this type covers everything around them.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SumoguardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SumoguardError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for Sumoguard operations
pub type Result<T> = std::result::Result<T, SumoguardError>;
