//! The mock engine: stub table, forbidden patterns, replay log and phases.
//!
//! ## Scenario contract
//!
//! One engine serves one scenario at a time. The engine is a cheap-clone
//! handle over `Rc<RefCell<..>>`, so it is `!Send`: tests that run in
//! parallel must each construct their own engine, and no phase is ever
//! shared between them.
//!
//! ## Phases
//!
//! | Phase | A call on a stand-in... |
//! |---|---|
//! | `StubDefinition` | records a pattern bound to the pending return value |
//! | `ForbidDefinition` | records a pattern that must not occur |
//! | `Replay` | is checked against forbidden patterns, answered from the newest matching stub, and logged |
//! | `Verification` | must match a logged call; answers what that call returned |
//!
//! ## Example
//!
//! ```
//! use mach::{Method, MockEngine, values};
//!
//! const GREET: Method = Method::new("Greeter", "greet", "fn Greeter::greet(&self, name: String) -> String");
//!
//! let engine = MockEngine::new();
//! let greeter = engine.dispatcher("greeter", "Greeter");
//!
//! engine.set_next_return("hello".to_string()).unwrap();
//! engine.set_next_wildcard(String::new()).unwrap();
//! greeter.try_invoke(GREET, values![String::new()]).unwrap();
//!
//! engine.begin_replay();
//! let answer: String = greeter.call(GREET, values!["ada".to_string()]);
//! assert_eq!(answer, "hello");
//! assert_eq!(engine.captured::<String>(None).unwrap(), "ada");
//!
//! engine.begin_verification();
//! engine.set_next_wildcard(String::new()).unwrap();
//! greeter.try_invoke(GREET, values![String::new()]).unwrap();
//! ```

use crate::config::EngineConfig;
use crate::dispatcher::{DispatcherId, MockDispatcher, StandIn};
use crate::invocation::Invocation;
use crate::phase::Phase;
use crate::result::{MachError, MachResult};
use crate::snapshot::{EngineSnapshot, LogRecord, StubRecord};
use crate::value::Value;
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::rc::Rc;

/// A pattern bound to the value it answers with
#[derive(Debug, Clone)]
struct StubEntry {
    pattern: Invocation,
    value: Option<Value>,
}

/// A pattern that must not occur during replay
#[derive(Debug, Clone)]
struct ForbiddenEntry {
    pattern: Invocation,
}

/// A call received during replay and what it returned
#[derive(Debug, Clone)]
struct LogEntry {
    invocation: Invocation,
    value: Option<Value>,
}

/// Log entry most recently matched, for argument capture
#[derive(Debug, Clone, Copy)]
struct CaptureCursor {
    entry: usize,
    wild: Option<usize>,
}

#[derive(Debug)]
struct EngineState {
    config: EngineConfig,
    phase: Option<Phase>,
    stubs: Vec<StubEntry>,
    forbidden: Vec<ForbiddenEntry>,
    log: Vec<LogEntry>,
    pending_value: Option<Value>,
    pending_wildcards: Vec<Value>,
    capture: Option<CaptureCursor>,
    dispatchers: HashMap<DispatcherId, String>,
}

impl EngineState {
    fn new(config: EngineConfig) -> Self {
        Self {
            phase: Some(config.initial_phase),
            config,
            stubs: Vec::new(),
            forbidden: Vec::new(),
            log: Vec::new(),
            pending_value: None,
            pending_wildcards: Vec::new(),
            capture: None,
            dispatchers: HashMap::new(),
        }
    }

    fn clear_tables(&mut self) {
        self.stubs.clear();
        self.forbidden.clear();
        self.log.clear();
        self.pending_value = None;
        self.pending_wildcards.clear();
        self.capture = None;
    }

    fn render_phase(&self) -> String {
        self.phase
            .map_or_else(|| "unset phase".to_string(), |phase| phase.to_string())
    }

    fn take_pattern(&mut self, call: Invocation) -> MachResult<Invocation> {
        let wildcards = mem::take(&mut self.pending_wildcards);
        call.with_wildcards(wildcards)
    }

    fn define_stub(&mut self, call: Invocation) -> MachResult<Option<Value>> {
        // Both pending slots are spent even when the pattern is rejected.
        let value = self.pending_value.take();
        let pattern = self.take_pattern(call)?;
        self.stubs.push(StubEntry {
            pattern,
            value: value.clone(),
        });
        Ok(value)
    }

    fn define_forbidden(&mut self, call: Invocation) -> MachResult<Option<Value>> {
        let pattern = self.take_pattern(call)?;
        self.forbidden.push(ForbiddenEntry { pattern });
        Ok(None)
    }

    fn replay(&mut self, call: Invocation) -> MachResult<Option<Value>> {
        if self.forbidden.iter().any(|entry| entry.pattern.matches(&call)) {
            return Err(MachError::UnwantedInvocation {
                call: call.to_string(),
            });
        }

        // Newest first: redefinition wins without removing older entries.
        let Some(stub) = self.stubs.iter().rev().find(|entry| entry.pattern.matches(&call)) else {
            return Err(self.unmatched(&call));
        };
        let value = stub.value.clone();
        let wild = stub.pattern.wild_positions().first().copied();

        self.log.push(LogEntry {
            invocation: call,
            value: value.clone(),
        });
        self.capture = Some(CaptureCursor {
            entry: self.log.len() - 1,
            wild,
        });
        Ok(value)
    }

    fn unmatched(&self, call: &Invocation) -> MachError {
        match self
            .stubs
            .iter()
            .rev()
            .find(|entry| {
                entry.pattern.target() == call.target() && entry.pattern.method() == call.method()
            })
        {
            Some(entry) => MachError::ArgumentMismatch {
                expected: entry.pattern.to_string(),
                received: call.to_string(),
            },
            None => MachError::UndefinedBehavior {
                method: call.method().to_string(),
                mock: self
                    .dispatchers
                    .get(&call.target())
                    .cloned()
                    .unwrap_or_else(|| call.target().to_string()),
            },
        }
    }

    fn verify(&mut self, call: Invocation) -> MachResult<Option<Value>> {
        let query = self.take_pattern(call)?;
        let Some(index) = self
            .log
            .iter()
            .rposition(|entry| entry.invocation.matches(&query))
        else {
            return Err(MachError::MissingInvocation {
                call: query.to_string(),
            });
        };
        self.capture = Some(CaptureCursor {
            entry: index,
            wild: query.wild_positions().first().copied(),
        });
        Ok(self.log[index].value.clone())
    }

    fn captured_argument(&self, index: Option<usize>) -> MachResult<Value> {
        let cursor = self.capture.ok_or(MachError::NothingCaptured)?;
        let call = self
            .log
            .get(cursor.entry)
            .map(|entry| &entry.invocation)
            .ok_or(MachError::NothingCaptured)?;

        let index = match (index, cursor.wild, call.args().len()) {
            (Some(index), _, _) => index,
            (None, Some(wild), _) => wild,
            (None, None, 0 | 1) => 0,
            (None, None, _) => {
                return Err(MachError::AmbiguousCapture {
                    call: call.to_string(),
                })
            }
        };

        call.arg(index)
            .cloned()
            .ok_or_else(|| MachError::CaptureIndexOutOfRange {
                index,
                call: call.to_string(),
            })
    }

    fn snapshot(&self) -> EngineSnapshot {
        let render = |value: &Option<Value>| value.as_ref().map(|v| format!("{v:?}"));
        EngineSnapshot {
            phase: self.phase,
            stubs: self
                .stubs
                .iter()
                .map(|entry| StubRecord {
                    pattern: entry.pattern.to_string(),
                    value: render(&entry.value),
                })
                .collect(),
            forbidden: self
                .forbidden
                .iter()
                .map(|entry| entry.pattern.to_string())
                .collect(),
            log: self
                .log
                .iter()
                .map(|entry| LogRecord {
                    call: entry.invocation.to_string(),
                    value: render(&entry.value),
                })
                .collect(),
            pending_value: render(&self.pending_value),
        }
    }
}

/// Orchestrates stubbing, forbidding, replay and verification
///
/// Cloning yields another handle to the same engine.
#[derive(Clone)]
pub struct MockEngine {
    state: Rc<RefCell<EngineState>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MockEngine")
            .field("phase", &state.phase)
            .field("stubs_count", &state.stubs.len())
            .field("forbidden_count", &state.forbidden.len())
            .field("log_len", &state.log.len())
            .field("pending_value", &state.pending_value)
            .finish()
    }
}

impl MockEngine {
    /// Create an engine in the stub-definition phase
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with explicit configuration
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(EngineState::new(config))),
        }
    }

    /// Create a dispatcher for a named stand-in of `capability`
    #[must_use]
    pub fn dispatcher(&self, name: &str, capability: &'static str) -> MockDispatcher {
        MockDispatcher::new(self.clone(), name, capability)
    }

    /// Create a named stand-in backed by a fresh dispatcher
    #[must_use]
    pub fn mock<M: StandIn>(&self, name: &str) -> M {
        M::from_dispatcher(self.dispatcher(name, M::CAPABILITY))
    }

    pub(crate) fn register_dispatcher(&self, id: DispatcherId, display: String) {
        self.state.borrow_mut().dispatchers.insert(id, display);
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Declare the value the next stubbed call answers with
    ///
    /// # Errors
    ///
    /// [`MachError::DeclarationOutOfPhase`] outside stub definition, or
    /// [`MachError::PendingValueUnconsumed`] if a value is already pending.
    pub fn set_next_return<T>(&self, value: T) -> MachResult<()>
    where
        T: Any + fmt::Debug + PartialEq,
    {
        self.set_next_return_value(Value::new(value))
    }

    /// Declare an already-erased value as the next return value
    ///
    /// # Errors
    ///
    /// Same as [`MockEngine::set_next_return`].
    pub fn set_next_return_value(&self, value: Value) -> MachResult<()> {
        let mut state = self.state.borrow_mut();
        if state.phase != Some(Phase::StubDefinition) {
            return Err(MachError::DeclarationOutOfPhase {
                operation: "set_next_return",
                phase: state.render_phase(),
            });
        }
        if let Some(previous) = &state.pending_value {
            return Err(MachError::PendingValueUnconsumed {
                previous: format!("{previous:?}"),
            });
        }
        tracing::trace!(value = ?value, "next return declared");
        state.pending_value = Some(value);
        Ok(())
    }

    /// Declare the wildcard markers attached to the next pattern
    ///
    /// An empty list means no wildcards.
    ///
    /// # Errors
    ///
    /// [`MachError::DeclarationOutOfPhase`] during replay.
    pub fn set_next_wildcards(&self, wildcards: Vec<Value>) -> MachResult<()> {
        let mut state = self.state.borrow_mut();
        if state.phase == Some(Phase::Replay) {
            return Err(MachError::DeclarationOutOfPhase {
                operation: "set_next_wildcards",
                phase: state.render_phase(),
            });
        }
        tracing::trace!(wildcards = ?wildcards, "next wildcards declared");
        state.pending_wildcards = wildcards;
        Ok(())
    }

    /// Declare a single wildcard marker, for one-argument methods
    ///
    /// # Errors
    ///
    /// Same as [`MockEngine::set_next_wildcards`].
    pub fn set_next_wildcard<T>(&self, sentinel: T) -> MachResult<()>
    where
        T: Any + fmt::Debug + PartialEq,
    {
        self.set_next_wildcards(vec![Value::new(sentinel)])
    }

    // =========================================================================
    // Phases
    // =========================================================================

    /// Switch the current phase
    pub fn switch_phase(&self, phase: Phase) {
        tracing::debug!(phase = %phase, "phase switched");
        self.state.borrow_mut().phase = Some(phase);
    }

    /// Switch to stub definition
    pub fn begin_stub(&self) {
        self.switch_phase(Phase::StubDefinition);
    }

    /// Switch to forbid definition
    pub fn begin_forbid(&self) {
        self.switch_phase(Phase::ForbidDefinition);
    }

    /// Switch to replay; the code under test runs in this phase
    pub fn begin_replay(&self) {
        self.switch_phase(Phase::Replay);
    }

    /// Switch to verification
    pub fn begin_verification(&self) {
        self.switch_phase(Phase::Verification);
    }

    /// Current phase; `None` once the scenario has ended
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        self.state.borrow().phase
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Interpret a call according to the current phase
    ///
    /// # Errors
    ///
    /// - [`MachError::InvalidPhase`] when no phase is active
    /// - [`MachError::WildcardArityMismatch`] when declared wildcards do not
    ///   fit the call
    /// - [`MachError::UnwantedInvocation`], [`MachError::ArgumentMismatch`] or
    ///   [`MachError::UndefinedBehavior`] during replay
    /// - [`MachError::MissingInvocation`] during verification
    pub fn dispatch(&self, call: Invocation) -> MachResult<Option<Value>> {
        let mut state = self.state.borrow_mut();
        let Some(phase) = state.phase else {
            return Err(MachError::InvalidPhase { phase: None });
        };
        let trace = state.config.trace_dispatch && tracing::enabled!(tracing::Level::DEBUG);
        let rendered = trace.then(|| call.to_string());

        let outcome = match phase {
            Phase::StubDefinition => state.define_stub(call),
            Phase::ForbidDefinition => state.define_forbidden(call),
            Phase::Replay => state.replay(call),
            Phase::Verification => state.verify(call),
        };

        if let Some(rendered) = rendered {
            match &outcome {
                Ok(value) => tracing::debug!(
                    phase = %phase,
                    call = %rendered,
                    value = ?value,
                    "dispatched"
                ),
                Err(err) => tracing::debug!(
                    phase = %phase,
                    call = %rendered,
                    error = %err,
                    "dispatch failed"
                ),
            }
        }
        outcome
    }

    // =========================================================================
    // Capture
    // =========================================================================

    /// Argument of the most recently matched call
    ///
    /// Without an index, the position that was wild in the matching pattern
    /// is used, or the sole argument of a one-argument call.
    ///
    /// # Errors
    ///
    /// [`MachError::NothingCaptured`], [`MachError::AmbiguousCapture`] or
    /// [`MachError::CaptureIndexOutOfRange`].
    pub fn last_captured_argument(&self, index: Option<usize>) -> MachResult<Value> {
        self.state.borrow().captured_argument(index)
    }

    /// Typed variant of [`MockEngine::last_captured_argument`]
    ///
    /// # Errors
    ///
    /// As [`MockEngine::last_captured_argument`], plus
    /// [`MachError::ReturnTypeMismatch`] when the argument is not a `T`.
    pub fn captured<T: Any + Clone>(&self, index: Option<usize>) -> MachResult<T> {
        let value = self.last_captured_argument(index)?;
        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| MachError::ReturnTypeMismatch {
                method: "last_captured_argument".to_string(),
                expected: type_name::<T>(),
                actual: format!("{value:?} ({})", value.type_name()),
            })
    }

    // =========================================================================
    // Lifecycle and inspection
    // =========================================================================

    /// Discard all tables and return to the configured initial phase
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.clear_tables();
        state.phase = Some(state.config.initial_phase);
        tracing::debug!("engine reset");
    }

    /// Discard all tables and leave the engine without a phase
    ///
    /// Stand-ins that outlive the scenario then fail with
    /// [`MachError::InvalidPhase`] instead of answering stale stubs.
    pub fn end_scenario(&self) {
        let mut state = self.state.borrow_mut();
        state.clear_tables();
        state.phase = None;
        tracing::debug!("scenario ended");
    }

    /// Number of stub entries
    #[must_use]
    pub fn stub_count(&self) -> usize {
        self.state.borrow().stubs.len()
    }

    /// Number of forbidden patterns
    #[must_use]
    pub fn forbidden_count(&self) -> usize {
        self.state.borrow().forbidden.len()
    }

    /// Number of calls logged during replay
    #[must_use]
    pub fn log_len(&self) -> usize {
        self.state.borrow().log.len()
    }

    /// Calls logged during replay, oldest first
    #[must_use]
    pub fn logged_calls(&self) -> Vec<Invocation> {
        self.state
            .borrow()
            .log
            .iter()
            .map(|entry| entry.invocation.clone())
            .collect()
    }

    /// Whether a return value is declared but not yet bound
    #[must_use]
    pub fn has_pending_value(&self) -> bool {
        self.state.borrow().pending_value.is_some()
    }

    /// Serializable view of the engine's tables
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        self.state.borrow().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::values;

    const NO_ARGS: Method = Method::new("Sample", "no_args", "fn Sample::no_args(&self) -> String");
    const ONE_ARG: Method = Method::new(
        "Sample",
        "one_arg",
        "fn Sample::one_arg(&self, arg: Option<String>) -> String",
    );
    const TWO_ARGS: Method = Method::new(
        "Sample",
        "two_args",
        "fn Sample::two_args(&self, a: u32, b: u32) -> u32",
    );

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_new_engine_starts_in_stub_definition() {
        assert_eq!(MockEngine::new().phase(), Some(Phase::StubDefinition));
    }

    #[test]
    fn test_config_sets_initial_phase() {
        let engine = MockEngine::with_config(EngineConfig::new().with_initial_phase(Phase::Replay));
        assert_eq!(engine.phase(), Some(Phase::Replay));
    }

    #[test]
    fn test_phase_persists_across_calls() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.begin_forbid();
        mock.try_invoke(NO_ARGS, values![]).unwrap();
        mock.try_invoke(NO_ARGS, values![]).unwrap();
        assert_eq!(engine.phase(), Some(Phase::ForbidDefinition));
        assert_eq!(engine.forbidden_count(), 2);
    }

    #[test]
    fn test_second_pending_value_is_rejected() {
        let engine = MockEngine::new();
        engine.set_next_return("first").unwrap();
        let err = engine.set_next_return("next").unwrap_err();
        assert_eq!(err.to_string(), "Return value [\"first\"] hasn't been mapped yet");
    }

    #[test]
    fn test_pending_value_is_consumed_by_stub() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return("first").unwrap();
        let bound = mock.try_invoke(NO_ARGS, values![]).unwrap();
        assert_eq!(bound, Some(Value::new("first")));
        assert!(!engine.has_pending_value());
        engine.set_next_return("second").unwrap();
    }

    #[test]
    fn test_set_next_return_outside_stub_definition() {
        let engine = MockEngine::new();
        engine.begin_replay();
        let err = engine.set_next_return(1_u8).unwrap_err();
        assert_eq!(
            err,
            MachError::DeclarationOutOfPhase {
                operation: "set_next_return",
                phase: "replay".to_string()
            }
        );
    }

    #[test]
    fn test_wildcards_rejected_during_replay() {
        let engine = MockEngine::new();
        engine.begin_replay();
        assert!(engine.set_next_wildcard(None::<String>).is_err());
    }

    #[test]
    fn test_last_one_wins() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return("first").unwrap();
        mock.try_invoke(NO_ARGS, values![]).unwrap();
        engine.set_next_return("second").unwrap();
        mock.try_invoke(NO_ARGS, values![]).unwrap();

        engine.begin_replay();
        let answer = mock.try_invoke(NO_ARGS, values![]).unwrap();
        assert_eq!(answer, Some(Value::new("second")));
        assert_eq!(engine.stub_count(), 2);
    }

    #[test]
    fn test_undefined_behavior_cites_method_and_mock() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("sample", "Sample");
        engine.begin_replay();
        let err = mock.try_invoke(NO_ARGS, values![]).unwrap_err();
        assert_eq!(
            err,
            MachError::UndefinedBehavior {
                method: NO_ARGS.to_string(),
                mock: mock.to_string(),
            }
        );
    }

    #[test]
    fn test_argument_mismatch_reports_newest_same_method_pattern() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return("X").unwrap();
        mock.try_invoke(ONE_ARG, values![some("right")]).unwrap();

        engine.begin_replay();
        let err = mock.try_invoke(ONE_ARG, values![some("wrong")]).unwrap_err();
        let expected = Invocation::new(mock.id(), ONE_ARG, values![some("right")]);
        let received = Invocation::new(mock.id(), ONE_ARG, values![some("wrong")]);
        assert_eq!(
            err.expected_and_received(),
            Some((expected.to_string().as_str(), received.to_string().as_str()))
        );
    }

    #[test]
    fn test_same_method_on_other_stand_in_is_undefined() {
        let engine = MockEngine::new();
        let a = engine.dispatcher("a", "Sample");
        let b = engine.dispatcher("b", "Sample");
        engine.set_next_return("X").unwrap();
        a.try_invoke(ONE_ARG, values![some("k")]).unwrap();

        engine.begin_replay();
        let err = b.try_invoke(ONE_ARG, values![some("k")]).unwrap_err();
        assert_eq!(
            err,
            MachError::UndefinedBehavior {
                method: ONE_ARG.to_string(),
                mock: b.to_string(),
            }
        );
    }

    #[test]
    fn test_wildcard_stub_matches_any_value() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return("Y").unwrap();
        engine.set_next_wildcard(None::<String>).unwrap();
        mock.try_invoke(ONE_ARG, values![None::<String>]).unwrap();

        engine.begin_replay();
        for arg in [some("a"), some("b"), None] {
            let answer = mock.try_invoke(ONE_ARG, values![arg]).unwrap();
            assert_eq!(answer, Some(Value::new("Y")));
        }
    }

    #[test]
    fn test_wildcards_apply_to_next_pattern_only() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_wildcard(None::<String>).unwrap();
        mock.try_invoke(ONE_ARG, values![None::<String>]).unwrap();
        mock.try_invoke(ONE_ARG, values![None::<String>]).unwrap();

        let snapshot = engine.snapshot();
        assert!(snapshot.stubs[0].pattern.ends_with("[None][None]"));
        assert!(snapshot.stubs[1].pattern.ends_with("[None][]"));
    }

    #[test]
    fn test_wildcard_arity_mismatch_fails_pattern_construction() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_wildcard(0_u32).unwrap();
        let err = mock.try_invoke(TWO_ARGS, values![0_u32, 0_u32]).unwrap_err();
        assert_eq!(
            err,
            MachError::WildcardArityMismatch {
                arguments: 2,
                wildcards: 1
            }
        );
    }

    #[test]
    fn test_rejected_pattern_spends_pending_value() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return(5_u32).unwrap();
        engine.set_next_wildcard(0_u32).unwrap();
        assert!(mock.try_invoke(TWO_ARGS, values![0_u32, 0_u32]).is_err());

        assert!(!engine.has_pending_value());
        assert_eq!(engine.stub_count(), 0);
        engine.set_next_return(6_u32).unwrap();
        mock.try_invoke(TWO_ARGS, values![0_u32, 0_u32]).unwrap();

        engine.begin_replay();
        let answer = mock.try_invoke(TWO_ARGS, values![0_u32, 0_u32]).unwrap();
        assert_eq!(answer, Some(Value::new(6_u32)));
    }

    #[test]
    fn test_dispatch_without_subscriber_or_tracing() {
        for trace in [true, false] {
            let engine = MockEngine::with_config(EngineConfig::new().with_trace_dispatch(trace));
            let mock = engine.dispatcher("m", "Sample");
            engine.set_next_return("x").unwrap();
            mock.try_invoke(NO_ARGS, values![]).unwrap();
            engine.begin_replay();
            assert_eq!(
                mock.try_invoke(NO_ARGS, values![]).unwrap(),
                Some(Value::new("x"))
            );
            engine.begin_verification();
            assert!(mock.try_invoke(ONE_ARG, values![None::<String>]).is_err());
        }
    }

    #[test]
    fn test_forbidden_call_fails_in_replay() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.begin_forbid();
        mock.try_invoke(NO_ARGS, values![]).unwrap();

        engine.begin_replay();
        let err = mock.try_invoke(NO_ARGS, values![]).unwrap_err();
        let call = Invocation::new(mock.id(), NO_ARGS, values![]);
        assert_eq!(err.to_string(), format!("Unwanted invocation {call}"));
    }

    #[test]
    fn test_forbidden_is_checked_before_stubs() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return("ok").unwrap();
        mock.try_invoke(NO_ARGS, values![]).unwrap();
        engine.begin_forbid();
        mock.try_invoke(NO_ARGS, values![]).unwrap();

        engine.begin_replay();
        assert!(matches!(
            mock.try_invoke(NO_ARGS, values![]),
            Err(MachError::UnwantedInvocation { .. })
        ));
        assert_eq!(engine.log_len(), 0);
    }

    #[test]
    fn test_forbidden_pattern_not_triggered_without_call() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.begin_forbid();
        mock.try_invoke(NO_ARGS, values![]).unwrap();
        engine.begin_replay();
        engine.begin_verification();
        assert_eq!(engine.log_len(), 0);
    }

    #[test]
    fn test_verify_missing_invocation() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.begin_verification();
        let err = mock.try_invoke(NO_ARGS, values![]).unwrap_err();
        let call = Invocation::new(mock.id(), NO_ARGS, values![]);
        assert_eq!(err.to_string(), format!("Missing invocation {call}"));
    }

    #[test]
    fn test_verify_returns_replayed_value_without_logging() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return("pudding").unwrap();
        mock.try_invoke(ONE_ARG, values![some("jello")]).unwrap();

        engine.begin_replay();
        mock.try_invoke(ONE_ARG, values![some("jello")]).unwrap();

        engine.begin_verification();
        let answer = mock.try_invoke(ONE_ARG, values![some("jello")]).unwrap();
        assert_eq!(answer, Some(Value::new("pudding")));
        assert_eq!(engine.log_len(), 1);
    }

    #[test]
    fn test_capture_after_replay_call() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return("don't care").unwrap();
        engine.set_next_wildcard(None::<String>).unwrap();
        mock.try_invoke(ONE_ARG, values![None::<String>]).unwrap();

        engine.begin_replay();
        mock.try_invoke(ONE_ARG, values![some("passed")]).unwrap();
        assert_eq!(
            engine.captured::<Option<String>>(None).unwrap(),
            some("passed")
        );
    }

    #[test]
    fn test_capture_after_wildcard_verification() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return("don't care").unwrap();
        engine.set_next_wildcard(None::<String>).unwrap();
        mock.try_invoke(ONE_ARG, values![None::<String>]).unwrap();

        engine.begin_replay();
        mock.try_invoke(ONE_ARG, values![some("first")]).unwrap();
        mock.try_invoke(ONE_ARG, values![some("second")]).unwrap();

        engine.begin_verification();
        engine.set_next_wildcard(None::<String>).unwrap();
        mock.try_invoke(ONE_ARG, values![None::<String>]).unwrap();
        assert_eq!(
            engine.last_captured_argument(None).unwrap(),
            Value::new(some("second"))
        );
    }

    #[test]
    fn test_capture_picks_wild_position() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return(9_u32).unwrap();
        engine.set_next_wildcards(values![1_u32, 0_u32]).unwrap();
        mock.try_invoke(TWO_ARGS, values![7_u32, 0_u32]).unwrap();

        engine.begin_replay();
        mock.try_invoke(TWO_ARGS, values![7_u32, 55_u32]).unwrap();
        assert_eq!(engine.captured::<u32>(None).unwrap(), 55);
        assert_eq!(engine.captured::<u32>(Some(0)).unwrap(), 7);
    }

    #[test]
    fn test_capture_errors() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        assert_eq!(
            engine.last_captured_argument(None).unwrap_err(),
            MachError::NothingCaptured
        );

        engine.set_next_return(1_u32).unwrap();
        mock.try_invoke(TWO_ARGS, values![1_u32, 2_u32]).unwrap();
        engine.begin_replay();
        mock.try_invoke(TWO_ARGS, values![1_u32, 2_u32]).unwrap();

        assert!(matches!(
            engine.last_captured_argument(None),
            Err(MachError::AmbiguousCapture { .. })
        ));
        assert!(matches!(
            engine.last_captured_argument(Some(2)),
            Err(MachError::CaptureIndexOutOfRange { index: 2, .. })
        ));
        assert!(matches!(
            engine.captured::<String>(Some(0)),
            Err(MachError::ReturnTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_end_scenario_makes_phase_invalid() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return("x").unwrap();
        mock.try_invoke(NO_ARGS, values![]).unwrap();

        engine.end_scenario();
        assert_eq!(engine.phase(), None);
        assert_eq!(engine.stub_count(), 0);
        let err = mock.try_invoke(NO_ARGS, values![]).unwrap_err();
        assert_eq!(err, MachError::InvalidPhase { phase: None });
        assert_eq!(err.to_string(), "Invalid phase: unset");
    }

    #[test]
    fn test_reset_restores_initial_phase() {
        let engine = MockEngine::new();
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return("x").unwrap();
        mock.try_invoke(NO_ARGS, values![]).unwrap();
        engine.begin_replay();
        mock.try_invoke(NO_ARGS, values![]).unwrap();

        engine.reset();
        assert_eq!(engine.phase(), Some(Phase::StubDefinition));
        assert!(engine.snapshot().is_empty());
        assert!(engine.last_captured_argument(None).is_err());
    }

    #[test]
    fn test_separate_engines_are_isolated() {
        let a = MockEngine::new();
        let b = MockEngine::new();
        a.begin_replay();
        assert_eq!(b.phase(), Some(Phase::StubDefinition));
    }

    #[test]
    fn test_snapshot_renders_tables() {
        let engine = MockEngine::with_config(EngineConfig::new().with_trace_dispatch(false));
        let mock = engine.dispatcher("m", "Sample");
        engine.set_next_return("X").unwrap();
        mock.try_invoke(ONE_ARG, values![some("a")]).unwrap();
        engine.begin_replay();
        mock.try_invoke(ONE_ARG, values![some("a")]).unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.phase, Some(Phase::Replay));
        assert_eq!(snapshot.stubs[0].value.as_deref(), Some("\"X\""));
        assert_eq!(snapshot.log.len(), 1);
        assert!(snapshot.log[0].call.contains("Some(\"a\")"));
    }
}
