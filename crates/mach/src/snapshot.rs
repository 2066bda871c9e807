//! Serializable snapshots of an engine's tables.
//!
//! Values and invocations are rendered to the same strings used in failure
//! messages, so a snapshot attached to a failing test reads like the failure.

use crate::phase::Phase;
use crate::result::{MachError, MachResult};
use serde::{Deserialize, Serialize};

/// A declared stub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubRecord {
    /// Rendered pattern
    pub pattern: String,
    /// Rendered return value, if one was bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A call received during replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Rendered call
    pub call: String,
    /// Rendered value that was returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Point-in-time view of a [`MockEngine`](crate::MockEngine)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Current phase, `None` once the scenario has ended
    pub phase: Option<Phase>,
    /// Stub table, oldest first
    pub stubs: Vec<StubRecord>,
    /// Forbidden patterns, oldest first
    pub forbidden: Vec<String>,
    /// Replay log, oldest first
    pub log: Vec<LogRecord>,
    /// Return value declared but not yet bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_value: Option<String>,
}

impl EngineSnapshot {
    /// Whether nothing has been declared or logged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
            && self.forbidden.is_empty()
            && self.log.is_empty()
            && self.pending_value.is_none()
    }

    /// Serialize to pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns [`MachError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> MachResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| MachError::Serialization {
            message: err.to_string(),
        })
    }
}
