//! Named singleton markers.
//!
//! A [`Sentinel`] is compared by identity only: two sentinels are equal
//! exactly when they are the same static, never because their names match.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A unique, named marker value.
#[derive(Debug)]
pub struct Sentinel {
    name: &'static str,
    module: &'static str,
    doc: &'static str,
}

impl Sentinel {
    /// Declares a sentinel. Bind the result to a `static` so it has one address.
    #[must_use]
    pub const fn new(name: &'static str, module: &'static str, doc: &'static str) -> Self {
        Self { name, module, doc }
    }

    /// Returns the sentinel's short name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the sentinel's docstring.
    #[must_use]
    pub const fn doc(&self) -> &'static str {
        self.doc
    }
}

impl PartialEq for Sentinel {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Sentinel {}

impl Hash for Sentinel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self, state);
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Marks "no value was provided", distinct from an explicit `None`.
pub static UNDEFINED: Sentinel = Sentinel::new(
    "Undefined",
    "traitconf",
    "Used to specify that no defaults are set or that no value was present",
);
