//! A method invocation with arguments.
//!
//! Invocation matching supports wildcards, which makes it intransitive: a
//! wildcard pattern matches two concrete calls that do not match each other.
//! `Invocation` therefore implements neither `PartialEq` nor `Hash`, and every
//! store of invocations is an ordered `Vec` scanned with [`Invocation::matches`].
//!
//! ## Wildcards
//!
//! A position is wild when the invocation carries a wildcard list and the
//! marker at that position equals the argument itself. The author passes the
//! same sentinel as both the argument and the marker:
//!
//! ```text
//! args      = [None, "exact"]
//! wildcards = [None, "other"]   -> position 0 is wild, position 1 is not
//! ```

use crate::dispatcher::DispatcherId;
use crate::method::Method;
use crate::result::{MachError, MachResult};
use crate::value::Value;
use std::fmt;

/// One call on a stand-in, or a pattern for such calls
#[derive(Clone)]
pub struct Invocation {
    target: DispatcherId,
    method: Method,
    args: Vec<Value>,
    wildcards: Option<Vec<Value>>,
}

impl Invocation {
    /// Create an invocation without wildcards
    #[must_use]
    pub fn new(target: DispatcherId, method: Method, args: Vec<Value>) -> Self {
        Self {
            target,
            method,
            args,
            wildcards: None,
        }
    }

    /// Create an invocation carrying a wildcard list
    ///
    /// # Errors
    ///
    /// Returns [`MachError::WildcardArityMismatch`] if the wildcard list is
    /// not as long as the argument list.
    pub fn with_wildcard_list(
        target: DispatcherId,
        method: Method,
        args: Vec<Value>,
        wildcards: Vec<Value>,
    ) -> MachResult<Self> {
        if args.len() != wildcards.len() {
            return Err(MachError::WildcardArityMismatch {
                arguments: args.len(),
                wildcards: wildcards.len(),
            });
        }
        Ok(Self {
            target,
            method,
            args,
            wildcards: Some(wildcards),
        })
    }

    /// Turn this invocation into a pattern carrying `wildcards`
    ///
    /// An empty list leaves the invocation without a wildcard list.
    ///
    /// # Errors
    ///
    /// Returns [`MachError::WildcardArityMismatch`] on a length mismatch.
    pub fn with_wildcards(self, wildcards: Vec<Value>) -> MachResult<Self> {
        if wildcards.is_empty() {
            return Ok(Self {
                wildcards: None,
                ..self
            });
        }
        Self::with_wildcard_list(self.target, self.method, self.args, wildcards)
    }

    /// Identity of the dispatcher the call was routed to
    #[must_use]
    pub const fn target(&self) -> DispatcherId {
        self.target
    }

    /// Method descriptor
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Arguments, in declaration order
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Argument at `index`
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Wildcard markers, if any were attached
    #[must_use]
    pub fn wildcards(&self) -> Option<&[Value]> {
        self.wildcards.as_deref()
    }

    /// Whether the method's result type is `()`
    #[must_use]
    pub const fn returns_unit(&self) -> bool {
        self.method.returns_unit
    }

    /// Whether position `index` matches any value
    #[must_use]
    pub fn is_wild(&self, index: usize) -> bool {
        match (&self.wildcards, self.args.get(index)) {
            (Some(wildcards), Some(arg)) => wildcards.get(index) == Some(arg),
            _ => false,
        }
    }

    /// All wild positions, ascending
    #[must_use]
    pub fn wild_positions(&self) -> Vec<usize> {
        (0..self.args.len()).filter(|&i| self.is_wild(i)).collect()
    }

    /// The wildcard-aware matching predicate
    ///
    /// Symmetric, but not transitive.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.target == other.target
            && self.method == other.method
            && self.args.len() == other.args.len()
            && self
                .args
                .iter()
                .zip(&other.args)
                .enumerate()
                .all(|(i, (mine, theirs))| mine == theirs || self.is_wild(i) || other.is_wild(i))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method)?;
        f.debug_list().entries(&self.args).finish()?;
        f.debug_list()
            .entries(self.wildcards.iter().flatten())
            .finish()
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("target", &self.target)
            .field("method", &self.method.name)
            .field("args", &self.args)
            .field("wildcards", &self.wildcards)
            .finish()
    }
}
