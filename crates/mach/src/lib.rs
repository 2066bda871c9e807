//! Mach: Record/Replay Test Doubles
//!
//! Mach lets a test create a stand-in for a trait, script its behaviour by
//! calling it, exercise the code under test, and then assert which calls
//! occurred by calling it again.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     MACH Architecture                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Stand-in   │    │ Mock       │    │ Mock       │            │
//! │   │ (#[mock])  │───►│ Dispatcher │───►│ Engine     │            │
//! │   │            │    │            │    │ (phases)   │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use mach::MockEngine;
//!
//! #[mach::mock]
//! trait Rocket {
//!     fn check_console(&self) -> String;
//!     fn throttle(&self, value: i32);
//! }
//!
//! let engine = MockEngine::new();
//! let rocket: RocketMock = engine.mock("rocket");
//!
//! // Script: the next call defines the stub
//! engine.set_next_return("Launch".to_string()).unwrap();
//! rocket.check_console();
//!
//! // Forbid any throttle call
//! engine.begin_forbid();
//! engine.set_next_wildcard(0).unwrap();
//! rocket.throttle(0);
//!
//! // Exercise
//! engine.begin_replay();
//! assert_eq!(rocket.check_console(), "Launch");
//!
//! // Verify
//! engine.begin_verification();
//! rocket.check_console();
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

// Generated stand-ins refer to `::mach`, including inside this crate.
extern crate self as mach;

mod config;
mod dispatcher;
mod engine;
mod invocation;
mod method;
mod phase;
mod result;
mod snapshot;
mod value;

/// Test logging through `tracing-subscriber`
pub mod logging;

/// Property-based testing strategies for invocations
#[cfg(feature = "proptest")]
#[allow(clippy::missing_panics_doc)]
pub mod strategies;

pub use config::EngineConfig;
pub use dispatcher::{DispatcherId, MockDispatcher, StandIn};
pub use engine::MockEngine;
pub use invocation::Invocation;
pub use method::Method;
pub use phase::Phase;
pub use result::{MachError, MachResult};
pub use snapshot::{EngineSnapshot, LogRecord, StubRecord};
pub use value::{MockValue, Value};

#[cfg(feature = "derive")]
pub use mach_derive::mock;

/// Commonly used types
pub mod prelude {
    pub use super::{
        values, EngineConfig, Invocation, MachError, MachResult, Method, MockDispatcher,
        MockEngine, Phase, StandIn, Value,
    };

    #[cfg(feature = "derive")]
    pub use super::mock;
}
