//! Proptest strategies for invocations.
//!
//! Values are drawn from deliberately small domains so that generated calls
//! collide often enough to exercise the matching predicate.
//!
//! ```rust,ignore
//! proptest! {
//!     #[test]
//!     fn prop_pattern_matches_its_calls((args, mask) in masked_arguments(3)) {
//!         let pattern = masked_pattern(target, METHOD, &args, &mask);
//!         prop_assert!(pattern.matches(&Invocation::new(target, METHOD, args)));
//!     }
//! }
//! ```

use crate::dispatcher::DispatcherId;
use crate::invocation::Invocation;
use crate::method::Method;
use crate::value::Value;
use proptest::prelude::*;

/// Marker that never equals a generated argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Exact;

/// Sentinel used for wild positions in [`masked_pattern`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wild;

/// A single argument value from a small mixed domain
pub fn argument_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0_i32..4).prop_map(Value::new),
        "[ab]{0,2}".prop_map(Value::new),
        proptest::option::of("[ab]{1}").prop_map(Value::new),
    ]
}

/// An argument list of exactly `arity` values
pub fn argument_list(arity: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(argument_value(), arity)
}

/// Arguments paired with a mask of positions to make wild
pub fn masked_arguments(arity: usize) -> impl Strategy<Value = (Vec<Value>, Vec<bool>)> {
    (
        argument_list(arity),
        prop::collection::vec(any::<bool>(), arity),
    )
}

/// Build a pattern whose masked positions are wild
///
/// Masked arguments are replaced by the [`Wild`] sentinel, which is also the
/// marker at those positions; other positions carry a marker that never
/// equals the argument.
#[must_use]
pub fn masked_pattern(
    target: DispatcherId,
    method: Method,
    args: &[Value],
    mask: &[bool],
) -> Invocation {
    let (pattern_args, wildcards): (Vec<_>, Vec<_>) = args
        .iter()
        .zip(mask)
        .map(|(arg, &wild)| {
            if wild {
                (Value::new(Wild), Value::new(Wild))
            } else {
                (arg.clone(), Value::new(Exact))
            }
        })
        .unzip();
    Invocation::with_wildcard_list(target, method, pattern_args, wildcards)
        .expect("argument and wildcard lists share a length")
}
