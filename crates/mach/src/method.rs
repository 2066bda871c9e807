//! Method descriptors.

use std::fmt;

/// Describes one method of a capability set (a trait)
///
/// Generated stand-ins hold one `const` descriptor per trait method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Method {
    /// Capability set the method belongs to
    pub capability: &'static str,
    /// Method name
    pub name: &'static str,
    /// Rendered signature, used verbatim in failure messages
    pub signature: &'static str,
    /// Whether the method's result type is `()`
    pub returns_unit: bool,
}

impl Method {
    /// Create a descriptor for a method returning a value
    #[must_use]
    pub const fn new(capability: &'static str, name: &'static str, signature: &'static str) -> Self {
        Self {
            capability,
            name,
            signature,
            returns_unit: false,
        }
    }

    /// Create a descriptor for a method returning `()`
    #[must_use]
    pub const fn unit(capability: &'static str, name: &'static str, signature: &'static str) -> Self {
        Self {
            capability,
            name,
            signature,
            returns_unit: true,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature)
    }
}
