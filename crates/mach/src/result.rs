//! Result and error types for Mach.
//!
//! Every variant is fatal for the scenario that raised it: a mismatch is a
//! defect in the test or in the code under test, never something to retry.

use crate::phase::Phase;
use thiserror::Error;

/// Result type for Mach operations
pub type MachResult<T> = Result<T, MachError>;

/// Errors that can occur while scripting or exercising stand-ins
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachError {
    /// A second return value was declared before the first was bound
    #[error("Return value [{previous}] hasn't been mapped yet")]
    PendingValueUnconsumed {
        /// Rendering of the value that is still pending
        previous: String,
    },

    /// Wildcard list and argument list differ in length
    #[error(
        "Must have the same number of arguments and wildcards \
         ({arguments} arguments, {wildcards} wildcards)"
    )]
    WildcardArityMismatch {
        /// Number of arguments in the call
        arguments: usize,
        /// Number of wildcard markers declared
        wildcards: usize,
    },

    /// A call was dispatched while no phase was active
    #[error("Invalid phase: {}", render_phase(.phase))]
    InvalidPhase {
        /// Phase at the time of the call
        phase: Option<Phase>,
    },

    /// Replay call to a method that was never stubbed
    #[error("[{method}] is not defined for [{mock}]")]
    UndefinedBehavior {
        /// Method descriptor
        method: String,
        /// Display string of the stand-in's dispatcher
        mock: String,
    },

    /// Replay call matched a stubbed method but none of its argument patterns
    #[error("Argument mismatch\n expected: {expected}\n received: {received}")]
    ArgumentMismatch {
        /// Newest pattern declared for the same method
        expected: String,
        /// The call actually received
        received: String,
    },

    /// Replay call matched a forbidden pattern
    #[error("Unwanted invocation {call}")]
    UnwantedInvocation {
        /// The offending call
        call: String,
    },

    /// Verification call has no counterpart in the replay log
    #[error("Missing invocation {call}")]
    MissingInvocation {
        /// The call being verified
        call: String,
    },

    /// A declaration was made in a phase that does not accept it
    #[error("{operation} is not allowed during {phase}")]
    DeclarationOutOfPhase {
        /// Declaration that was attempted
        operation: &'static str,
        /// Phase at the time of the declaration
        phase: String,
    },

    /// A scripted or captured value has a different type than requested
    #[error("[{method}] expected a value of type {expected}, found {actual}")]
    ReturnTypeMismatch {
        /// Method or operation that produced the value
        method: String,
        /// Requested type
        expected: &'static str,
        /// Rendering of the value that was found
        actual: String,
    },

    /// Argument capture was requested before any call was matched
    #[error("No invocation has been matched yet, nothing to capture")]
    NothingCaptured,

    /// Argument capture index is past the end of the matched call
    #[error("Cannot capture argument {index} of {call}")]
    CaptureIndexOutOfRange {
        /// Requested position
        index: usize,
        /// The matched call
        call: String,
    },

    /// Argument capture without an index on a call with several arguments
    /// and no wild position
    #[error("Argument position is ambiguous for {call}; pass an index")]
    AmbiguousCapture {
        /// The matched call
        call: String,
    },

    /// Engine configuration could not be parsed
    #[error("Invalid engine configuration: {message}")]
    InvalidConfig {
        /// Parser message
        message: String,
    },

    /// Engine snapshot could not be serialized
    #[error("Snapshot serialization failed: {message}")]
    Serialization {
        /// Serializer message
        message: String,
    },
}

impl MachError {
    /// Expected and received renderings, only for argument mismatches.
    ///
    /// Assertion tooling uses this to render a structured diff when a
    /// comparable expectation exists.
    #[must_use]
    pub fn expected_and_received(&self) -> Option<(&str, &str)> {
        match self {
            Self::ArgumentMismatch { expected, received } => {
                Some((expected.as_str(), received.as_str()))
            }
            _ => None,
        }
    }
}

fn render_phase(phase: &Option<Phase>) -> String {
    phase.map_or_else(|| "unset".to_string(), |p| p.to_string())
}
