//! Engine configuration.

use crate::phase::Phase;
use crate::result::{MachError, MachResult};
use serde::{Deserialize, Serialize};

/// Configuration for a [`MockEngine`](crate::MockEngine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Phase the engine starts in, and returns to on `reset()`
    pub initial_phase: Phase,
    /// Emit a `tracing` event for every dispatched call
    pub trace_dispatch: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_phase: Phase::StubDefinition,
            trace_dispatch: true,
        }
    }
}

impl EngineConfig {
    /// Create a new config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial phase
    #[must_use]
    pub const fn with_initial_phase(mut self, phase: Phase) -> Self {
        self.initial_phase = phase;
        self
    }

    /// Enable or disable per-dispatch tracing events
    #[must_use]
    pub const fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }

    /// Parse a config from JSON; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or names an unknown phase.
    pub fn from_json(json: &str) -> MachResult<Self> {
        serde_json::from_str(json).map_err(|err| MachError::InvalidConfig {
            message: err.to_string(),
        })
    }
}
