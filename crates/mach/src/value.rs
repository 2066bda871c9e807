//! Type-erased argument and return values.
//!
//! Stand-ins forward arbitrary argument types to one engine, so values are
//! erased behind [`MockValue`] and compared dynamically. Values of different
//! concrete types are never equal.

use std::any::{type_name, Any};
use std::fmt;
use std::rc::Rc;

/// Object-safe view of a value that can flow through a stand-in
pub trait MockValue: Any {
    /// Dynamic equality; `false` when `other` has a different concrete type
    fn eq_value(&self, other: &dyn MockValue) -> bool;

    /// Render the value for failure messages
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// Name of the concrete type
    fn value_type_name(&self) -> &'static str;

    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl<T> MockValue for T
where
    T: Any + fmt::Debug + PartialEq,
{
    fn eq_value(&self, other: &dyn MockValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A shared, immutable, type-erased value
#[derive(Clone)]
pub struct Value(Rc<dyn MockValue>);

impl Value {
    /// Wrap a concrete value
    pub fn new<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + PartialEq,
    {
        Self(Rc::new(value))
    }

    /// The unit value, used for methods without a result
    #[must_use]
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Borrow the concrete value if it has type `T`
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Whether the concrete value has type `T`
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// Name of the concrete type
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.value_type_name()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_value(other.0.as_ref())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.render(f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.render(f)
    }
}

/// Build a `Vec<Value>` from heterogeneous expressions
///
/// ```
/// let args = mach::values!["jello", 42_u32];
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::new($value)),+]
    };
}
