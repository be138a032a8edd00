//! Error type for trait validation and the object model.

use thiserror::Error;

/// Error raised by trait validation, object attribute access, observers and
/// cross-validators.
///
/// `subject` fields already read like "The 'x' trait of a Foo instance" so
/// messages stay self-contained when they bubble up through config loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraitError {
    /// A value failed a trait's type or membership check.
    #[error("{subject} expected {expected}, not {value}.")]
    Validation {
        /// Which trait rejected the value
        subject: String,
        /// The trait's `info()` description
        expected: String,
        /// Description of the rejected value
        value: String,
    },

    /// A numeric value fell outside the trait's inclusive bounds.
    #[error(
        "The value of {subject} should not be {relation} {bound}, but a value of {value} was specified"
    )]
    OutOfBounds {
        /// Which trait rejected the value
        subject: String,
        /// "less than" or "greater than"
        relation: &'static str,
        /// The violated bound
        bound: String,
        /// The rejected value
        value: String,
    },

    /// A container's length fell outside `minlen..=maxlen`.
    #[error(
        "{subject} must be of length {min} <= L <= {max}, but a value of {value} was specified."
    )]
    Length {
        /// Which trait rejected the value
        subject: String,
        /// Minimum length
        min: usize,
        /// Maximum length
        max: usize,
        /// The rejected value
        value: String,
    },

    /// Attempted an external write to a read-only trait.
    #[error("The \"{name}\" trait is read-only.")]
    ReadOnly {
        /// Trait name
        name: String,
    },

    /// An unset trait has neither a dynamic nor a static default.
    #[error("No default value found for the {kind} trait named '{name}' of {owner}")]
    NoDefault {
        /// Trait type name, e.g. `Instance`
        kind: &'static str,
        /// Trait name
        name: String,
        /// Owner description, e.g. "a Foo"
        owner: String,
    },

    /// The class declares no trait with this name.
    #[error("'{class}' object has no trait named '{name}'")]
    UnknownTrait {
        /// Class name
        class: String,
        /// Requested trait name
        name: String,
    },

    /// A second cross-validator was registered for the same trait.
    #[error("A cross-validator is already registered for the '{name}' trait of {class}")]
    DuplicateValidator {
        /// Class name
        class: String,
        /// Trait name
        name: String,
    },

    /// A raw builtin container was assigned to an eventful trait.
    #[error(
        "{subject} is eventful and cannot hold the raw {kind} {value}; assign an eventful container"
    )]
    RawBuiltin {
        /// Which trait rejected the value
        subject: String,
        /// Container kind, e.g. "list"
        kind: &'static str,
        /// The rejected value
        value: String,
    },

    /// The source of a bidirectional link changed while the link was
    /// updating its target.
    #[error("Broken link {source_end} -> {target_end}: the source value changed while updating the target.")]
    BrokenLink {
        /// `Class.trait` of the source end
        source_end: String,
        /// `Class.trait` of the target end
        target_end: String,
    },

    /// A forward-declared class name could not be resolved.
    #[error("Could not resolve the class '{name}' named by {subject}")]
    UnresolvedClass {
        /// The unresolved class name
        name: String,
        /// Which trait named it
        subject: String,
    },

    /// An eventful container lookup failed (missing key, element or index).
    #[error("{0} is not present in the container")]
    Missing(String),

    /// Raised by user observers, validators and callables.
    #[error("{0}")]
    Custom(String),
}

impl TraitError {
    /// Creates a free-form error, typically from a user callback.
    #[must_use]
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Creates a read-only violation error.
    #[must_use]
    pub fn read_only(name: impl Into<String>) -> Self {
        Self::ReadOnly { name: name.into() }
    }

    /// Creates an unknown-trait error.
    #[must_use]
    pub fn unknown_trait(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownTrait {
            class: class.into(),
            name: name.into(),
        }
    }
}
