//! Per-stand-in dispatchers.
//!
//! A [`MockDispatcher`] is what a stand-in holds: its identity, its display
//! name and a handle to the engine it forwards to. Generated stand-ins (see
//! `#[mach::mock]`) and hand-written adapters both route every trait method
//! through [`MockDispatcher::call`] or [`MockDispatcher::call_unit`].
//!
//! ## Example
//!
//! ```
//! use mach::{Method, MockDispatcher, MockEngine, StandIn, values};
//!
//! trait Clock {
//!     fn now(&self) -> u64;
//! }
//!
//! struct ClockStandIn(MockDispatcher);
//!
//! const NOW: Method = Method::new("Clock", "now", "fn Clock::now(&self) -> u64");
//!
//! impl StandIn for ClockStandIn {
//!     const CAPABILITY: &'static str = "Clock";
//!     fn from_dispatcher(dispatcher: MockDispatcher) -> Self {
//!         Self(dispatcher)
//!     }
//!     fn dispatcher(&self) -> &MockDispatcher {
//!         &self.0
//!     }
//! }
//!
//! impl Clock for ClockStandIn {
//!     fn now(&self) -> u64 {
//!         self.0.call(NOW, values![])
//!     }
//! }
//!
//! let engine = MockEngine::new();
//! let clock: ClockStandIn = engine.mock("clock");
//!
//! engine.set_next_return(42_u64).unwrap();
//! clock.now();
//!
//! engine.begin_replay();
//! assert_eq!(clock.now(), 42);
//! ```

use crate::engine::MockEngine;
use crate::invocation::Invocation;
use crate::method::Method;
use crate::result::{MachError, MachResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::any::{type_name, Any};
use std::fmt;
use uuid::Uuid;

/// Runtime-unique identity of a dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatcherId(Uuid);

impl DispatcherId {
    /// Generate a fresh identity
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DispatcherId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DispatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value that stands in for a capability set (a trait)
///
/// Implemented by `#[mach::mock]`-generated structs and by hand-written
/// adapters.
pub trait StandIn: Sized {
    /// Descriptor of the capability set this stand-in satisfies
    const CAPABILITY: &'static str;

    /// Wrap a dispatcher bound to an engine
    fn from_dispatcher(dispatcher: MockDispatcher) -> Self;

    /// The dispatcher this stand-in forwards to
    fn dispatcher(&self) -> &MockDispatcher;
}

/// Adapts calls on one stand-in into invocations for its engine
pub struct MockDispatcher {
    id: DispatcherId,
    name: String,
    capability: &'static str,
    engine: MockEngine,
}

impl MockDispatcher {
    /// Create a dispatcher bound to `engine`
    #[must_use]
    pub fn new(engine: MockEngine, name: &str, capability: &'static str) -> Self {
        let dispatcher = Self {
            id: DispatcherId::new(),
            name: name.to_string(),
            capability,
            engine,
        };
        dispatcher
            .engine
            .register_dispatcher(dispatcher.id, dispatcher.to_string());
        dispatcher
    }

    /// Identity of this dispatcher
    #[must_use]
    pub const fn id(&self) -> DispatcherId {
        self.id
    }

    /// Declared name of the stand-in
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capability set descriptor
    #[must_use]
    pub const fn capability(&self) -> &'static str {
        self.capability
    }

    /// Engine this dispatcher forwards to
    #[must_use]
    pub const fn engine(&self) -> &MockEngine {
        &self.engine
    }

    /// Identity-level equality against an arbitrary value
    ///
    /// True only when `other` is this very dispatcher (or one with the same
    /// identity); a stand-in or an [`Invocation`] never counts.
    #[must_use]
    pub fn is_same(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<Self>()
            .is_some_and(|other| other.id == self.id)
    }

    /// Forward a call and return the engine's raw answer
    ///
    /// # Errors
    ///
    /// Propagates every dispatch failure of [`MockEngine::dispatch`].
    pub fn try_invoke(&self, method: Method, args: Vec<Value>) -> MachResult<Option<Value>> {
        self.engine
            .dispatch(Invocation::new(self.id, method, args))
    }

    /// Forward a call and convert the answer to `R`
    ///
    /// `R::default()` stands in when the matched stub bound no value.
    ///
    /// # Errors
    ///
    /// Dispatch failures, or [`MachError::ReturnTypeMismatch`] when the
    /// scripted value is not an `R`.
    pub fn try_call<R>(&self, method: Method, args: Vec<Value>) -> MachResult<R>
    where
        R: Any + Clone + Default,
    {
        match self.try_invoke(method, args)? {
            None => Ok(R::default()),
            Some(value) => value.downcast_ref::<R>().cloned().ok_or_else(|| {
                MachError::ReturnTypeMismatch {
                    method: method.to_string(),
                    expected: type_name::<R>(),
                    actual: format!("{value:?} ({})", value.type_name()),
                }
            }),
        }
    }

    /// Forward a call from a stand-in method returning `R`
    ///
    /// # Panics
    ///
    /// Panics with the failure message when dispatch fails. Failures are
    /// fatal for the scenario and surface to the test runner.
    pub fn call<R>(&self, method: Method, args: Vec<Value>) -> R
    where
        R: Any + Clone + Default,
    {
        match self.try_call(method, args) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Forward a call from a stand-in method returning `()`
    ///
    /// # Panics
    ///
    /// Panics with the failure message when dispatch fails.
    pub fn call_unit(&self, method: Method, args: Vec<Value>) {
        if let Err(err) = self.try_invoke(method, args) {
            panic!("{err}");
        }
    }
}

impl PartialEq for MockDispatcher {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MockDispatcher {}

impl fmt::Display for MockDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.name, self.capability, self.id)
    }
}

impl fmt::Debug for MockDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDispatcher")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("capability", &self.capability)
            .finish()
    }
}
