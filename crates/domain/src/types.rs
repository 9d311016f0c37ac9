//! Common data types used throughout the workspace

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-call context supplied to the error handling pipeline
///
/// Entity fields feed not-found and conflict reclassification; `extra`
/// entries are merged into the context of every failure the call produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationContext {
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    pub entity_state: Option<String>,
    /// Deadline for this call only; `None` uses the configured timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_override: Option<Duration>,
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_entity_state(mut self, state: impl Into<String>) -> Self {
        self.entity_state = Some(state.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(timeout);
        self
    }

    /// Attach an extra key; later values overwrite earlier ones.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// True when any entity field is set
    pub fn has_entity(&self) -> bool {
        self.entity_id.is_some() || self.entity_name.is_some()
    }
}
