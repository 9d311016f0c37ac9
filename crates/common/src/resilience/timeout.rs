//! Per-operation deadlines
//!
//! [`TimeoutManager`] maps operation names to deadlines and falls back to a
//! process default. The effective deadline for one invocation is the
//! caller's override, else the registered value, else the default.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::time::Duration;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, warn};

use super::{ConfigError, ConfigResult};
use crate::error::Failure;

/// Deadline used when nothing else is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The guarded work did not finish before its deadline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Operation '{operation}' timed out after {timeout:?}")]
pub struct TimeoutElapsed {
    /// Operation name
    pub operation: String,
    /// Deadline that was exceeded
    pub timeout: Duration,
}

impl From<TimeoutElapsed> for Failure {
    fn from(err: TimeoutElapsed) -> Self {
        Self::timeout(err.operation, err.timeout)
    }
}

/// A blocking task panicked or was aborted before producing a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Blocking task for '{operation}' aborted: {reason}")]
pub struct TaskAborted {
    /// Operation name
    pub operation: String,
    /// Join error description
    pub reason: String,
}

impl From<TaskAborted> for Failure {
    fn from(err: TaskAborted) -> Self {
        Self::generic(err.to_string()).with_context("operation", err.operation)
    }
}

/// Registry of per-operation timeouts
#[derive(Debug)]
pub struct TimeoutManager {
    default_timeout: Duration,
    timeouts: RwLock<HashMap<String, Duration>>,
}

impl Default for TimeoutManager {
    fn default() -> Self {
        Self { default_timeout: DEFAULT_TIMEOUT, timeouts: RwLock::new(HashMap::new()) }
    }
}

impl TimeoutManager {
    /// Create a manager with the given default
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if `default_timeout` is zero.
    pub fn new(default_timeout: Duration) -> ConfigResult<Self> {
        ensure_positive("default timeout", default_timeout)?;
        Ok(Self { default_timeout, timeouts: RwLock::new(HashMap::new()) })
    }

    /// Create a manager pre-populated with per-operation timeouts
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if any value is zero.
    pub fn with_timeouts<I, S>(default_timeout: Duration, timeouts: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (S, Duration)>,
        S: Into<String>,
    {
        let manager = Self::new(default_timeout)?;
        for (operation, timeout) in timeouts {
            manager.set_timeout(operation, timeout)?;
        }
        Ok(manager)
    }

    /// Register or replace the timeout for `operation`
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if `timeout` is zero; the registry
    /// is left unchanged.
    pub fn set_timeout(&self, operation: impl Into<String>, timeout: Duration) -> ConfigResult<()> {
        let operation = operation.into();
        ensure_positive(&operation, timeout)?;
        debug!(
            operation = %operation,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "Timeout registered"
        );
        self.timeouts.write().insert(operation, timeout);
        Ok(())
    }

    /// Registered timeout for `operation`, else the default
    pub fn get_timeout(&self, operation: &str) -> Duration {
        self.timeouts.read().get(operation).copied().unwrap_or(self.default_timeout)
    }

    /// Process-wide default
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Deadline for one invocation of `operation`
    ///
    /// A zero override is ignored, so the registered or default deadline
    /// applies instead.
    pub fn effective_timeout(&self, operation: &str, timeout_override: Option<Duration>) -> Duration {
        match timeout_override {
            Some(timeout) if !timeout.is_zero() => timeout,
            Some(_) => {
                debug!(operation, "Ignoring zero timeout override");
                self.get_timeout(operation)
            }
            None => self.get_timeout(operation),
        }
    }

    /// Copy of every registered timeout, ordered by name
    pub fn snapshot(&self) -> BTreeMap<String, Duration> {
        self.timeouts.read().iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    /// Run `future` under the effective deadline for `operation`
    ///
    /// On expiry the future is dropped and `E::from(TimeoutElapsed)` is
    /// returned with the operation name and the deadline applied.
    pub async fn execute_with_timeout<F, T, E>(
        &self,
        operation: &str,
        timeout_override: Option<Duration>,
        future: F,
    ) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<TimeoutElapsed>,
    {
        let timeout = self.effective_timeout(operation, timeout_override);
        if let Ok(result) = tokio::time::timeout(timeout, future).await {
            result
        } else {
            warn!(
                operation,
                timeout_seconds = timeout.as_secs_f64(),
                "Operation exceeded its deadline"
            );
            Err(E::from(TimeoutElapsed { operation: operation.to_string(), timeout }))
        }
    }

    /// Run a synchronous closure on the blocking pool under the deadline
    ///
    /// The closure keeps running to completion on its thread after a
    /// timeout; only its result is discarded.
    pub async fn execute_blocking_with_timeout<F, T, E>(
        &self,
        operation: &str,
        timeout_override: Option<Duration>,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<TimeoutElapsed> + From<TaskAborted> + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(work);
        self.execute_with_timeout(operation, timeout_override, async {
            handle.await.map_err(|join_err| {
                E::from(TaskAborted { operation: operation.to_string(), reason: join_err.to_string() })
            })?
        })
        .await
    }
}

fn ensure_positive(what: &str, timeout: Duration) -> ConfigResult<()> {
    if timeout.is_zero() {
        return Err(ConfigError::invalid(format!("timeout for {what} must be positive")));
    }
    Ok(())
}
