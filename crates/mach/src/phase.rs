//! The phase of mocking.
//!
//! A phase decides how every call routed to a stand-in is interpreted. It is
//! owned by a [`MockEngine`](crate::MockEngine) and only ever changes through
//! an explicit switch; it is never reset after a call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the engine interprets dispatched calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Calls record a stub pattern bound to the pending return value.
    ///
    /// Used to define behaviour prior to exercising the code under test.
    StubDefinition,
    /// Calls record a pattern that must not occur during replay.
    ForbidDefinition,
    /// Calls behave according to the stubs and are logged.
    ///
    /// This is the only phase the code under test should see.
    Replay,
    /// Calls assert that a matching call was logged during replay.
    Verification,
}

impl Phase {
    /// All phases, in their usual order within a scenario
    pub const ALL: [Self; 4] = [
        Self::StubDefinition,
        Self::ForbidDefinition,
        Self::Replay,
        Self::Verification,
    ];

    /// Short name used in log output
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StubDefinition => "stub-definition",
            Self::ForbidDefinition => "forbid-definition",
            Self::Replay => "replay",
            Self::Verification => "verification",
        }
    }

    /// Whether calls in this phase declare patterns rather than exercise them
    #[must_use]
    pub const fn is_definition(self) -> bool {
        matches!(self, Self::StubDefinition | Self::ForbidDefinition)
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::StubDefinition
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
