//! Trait types: typed, validated attribute descriptors.
//!
//! A [`TraitType`] pairs a [`TraitKind`] (the type-specific validation and
//! default policy) with the options every trait shares: default source,
//! `allow_none`, `read_only`, help text and metadata. Traits are bound to
//! exactly one `(class, name)` site when their class is built, and every
//! get or set on an instance goes through [`TraitType::validate`].
//!
//! # Example
//!
//! ```
//! use traitconf::has_traits::{Class, HasTraits};
//! use traitconf::trait_types::{Int, TraitBuilder, Unicode};
//!
//! let class = Class::builder("Server")
//!     .add_trait("port", Int::new().min(1).max(65535).default_value(8080).config())
//!     .add_trait("host", Unicode::new().default_value("localhost"))
//!     .build();
//! let server = HasTraits::new(&class).unwrap();
//! assert_eq!(server.get("port").unwrap().as_int(), Some(8080));
//! assert!(server.set("port", 0).is_err());
//! ```

mod choice;
mod class_based;
mod container;
mod error;
mod misc;
mod numeric;
mod text;

use std::cell::OnceCell;
use std::fmt;
use std::ops::BitOr;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::describe::{Article, add_article, describe};
use crate::has_traits::{Class, ClassInner, HasTraits, Proposal};
use crate::value::Value;

pub use choice::{CaselessStrEnum, Enum, FuzzyEnum};
pub use class_based::{Instance, This, Type};
pub use container::{Dict, List, Set, Tuple};
pub use error::TraitError;
pub use misc::{Any, CRegExp, Callable, TcpAddress, Union};
pub use numeric::{Bool, Float, Int};
pub use text::{Bytes, DottedObjectName, ObjectName, Unicode};

pub(crate) use text::is_identifier;

/// Computes a value for an object, used for dynamic defaults.
pub type DefaultFn = Rc<dyn Fn(&HasTraits) -> Result<Value, TraitError>>;

/// Where a trait's default value comes from.
#[derive(Clone, Default)]
pub enum DefaultSource {
    /// The trait kind's own default (e.g. `0` for `Int`).
    #[default]
    Kind,
    /// A fixed value, deep-copied for every instance.
    Static(Value),
    /// A generator run against the instance on first read.
    Dynamic(DefaultFn),
}

/// Container shape of a trait, used by command-line loaders to pick
/// multiplicity and value parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    List,
    Set,
    Tuple,
    Dict,
}

/// Type-specific behavior of a trait.
pub trait TraitKind {
    /// Short type name, e.g. `Int`.
    fn type_name(&self) -> &'static str;

    /// Describes the accepted values, e.g. "an int".
    fn info(&self) -> String;

    /// Checks and coerces a value. `trait_type` is the descriptor owning this
    /// kind; errors should be built with [`TraitType::error`].
    ///
    /// # Errors
    ///
    /// Returns a [`TraitError`] when the value is not acceptable.
    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError>;

    /// The kind's static default, if it has one.
    fn default_value(&self) -> Option<Value> {
        None
    }

    /// A per-instance default computed on first read, if the kind makes one.
    fn dynamic_default(&self) -> Option<Result<Value, TraitError>> {
        None
    }

    /// Traits nested inside this one (container elements, union members).
    fn nested(&self) -> Vec<Rc<TraitType>> {
        Vec::new()
    }

    /// Whether nested traits sit one level deeper (container elements) or at
    /// the same level (union members).
    fn nests_elements(&self) -> bool {
        true
    }

    /// Per-instance setup, run once when an instance is created.
    ///
    /// # Errors
    ///
    /// Returns a [`TraitError`] when setup cannot complete.
    fn instance_init(&self, _trait_type: &TraitType, _obj: &HasTraits) -> Result<(), TraitError> {
        Ok(())
    }

    /// Whether values are wrapped in eventful containers.
    fn is_eventful(&self) -> bool {
        false
    }

    /// Re-validates an eventful container after an in-place mutation.
    ///
    /// # Errors
    ///
    /// Returns a [`TraitError`] when the mutated contents are invalid.
    fn validate_mutation(
        &self,
        _trait_type: &Rc<TraitType>,
        _obj: &HasTraits,
        _value: &Value,
    ) -> Result<(), TraitError> {
        Ok(())
    }

    /// Container shape, if this is a container trait.
    fn container(&self) -> Option<ContainerKind> {
        None
    }
}

/// Where a trait is bound: its class, attribute name and nesting depth.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    class: Weak<ClassInner>,
    class_name: String,
    name: Option<String>,
    absolute_name: String,
    depth: usize,
}

/// A trait descriptor.
pub struct TraitType {
    kind: Box<dyn TraitKind>,
    default: DefaultSource,
    allow_none: bool,
    read_only: bool,
    help: String,
    metadata: IndexMap<String, Value>,
    binding: OnceCell<Binding>,
}

impl TraitType {
    /// Wraps a kind with default options.
    pub fn new(kind: impl TraitKind + 'static) -> Self {
        Self {
            kind: Box::new(kind),
            default: DefaultSource::Kind,
            allow_none: false,
            read_only: false,
            help: String::new(),
            metadata: IndexMap::new(),
            binding: OnceCell::new(),
        }
    }

    /// The kind's type name, e.g. `Int`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Describes accepted values, including `or None` when allowed.
    #[must_use]
    pub fn info(&self) -> String {
        let info = self.kind.info();
        if self.allow_none {
            format!("{info} or None")
        } else {
            info
        }
    }

    /// The attribute name, once bound. Nested element traits have none.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.binding.get().and_then(|b| b.name.as_deref())
    }

    /// The class that declared this trait, while it is alive.
    #[must_use]
    pub fn this_class(&self) -> Option<Class> {
        self.binding
            .get()
            .and_then(|b| b.class.upgrade())
            .map(Class::from_inner)
    }

    /// The name of the class that declared this trait, once bound.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.binding.get().map(|b| b.class_name.as_str())
    }

    #[must_use]
    pub const fn allows_none(&self) -> bool {
        self.allow_none
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[must_use]
    pub fn help_text(&self) -> &str {
        &self.help
    }

    /// Looks up one metadata entry.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// All metadata entries, in tagging order.
    #[must_use]
    pub const fn metadata_map(&self) -> &IndexMap<String, Value> {
        &self.metadata
    }

    /// True when tagged `config=True`.
    #[must_use]
    pub fn is_configurable(&self) -> bool {
        self.metadata.get("config").is_some_and(Value::is_truthy)
    }

    #[must_use]
    pub fn is_eventful(&self) -> bool {
        self.kind.is_eventful()
    }

    #[must_use]
    pub fn container(&self) -> Option<ContainerKind> {
        self.kind.container()
    }

    /// The static default, or `Undefined` when the default is dynamic or
    /// missing. Used as the "previous" value of a never-set trait.
    #[must_use]
    pub fn static_default(&self) -> Value {
        match &self.default {
            DefaultSource::Static(value) => value.deep_copy(),
            DefaultSource::Dynamic(_) => Value::undefined(),
            DefaultSource::Kind => self.kind_default(),
        }
    }

    fn kind_default(&self) -> Value {
        self.kind.default_value().unwrap_or_else(|| {
            if self.allow_none {
                Value::None
            } else {
                Value::undefined()
            }
        })
    }

    /// Produces the trait-level default for `obj`, before validation.
    pub(crate) fn make_default(&self, obj: &HasTraits) -> Result<Value, TraitError> {
        match &self.default {
            DefaultSource::Static(value) => Ok(value.deep_copy()),
            DefaultSource::Dynamic(generate) => generate(obj),
            DefaultSource::Kind => self
                .kind
                .dynamic_default()
                .unwrap_or_else(|| Ok(self.kind_default())),
        }
    }

    /// Validates a value for `obj`: the `None` shortcut, the kind's own
    /// checks, then the object's cross-validator unless the lock is held.
    ///
    /// # Errors
    ///
    /// Returns the first [`TraitError`] raised by any stage.
    pub fn validate(self: &Rc<Self>, obj: &HasTraits, value: Value) -> Result<Value, TraitError> {
        if value.is_none() && self.allow_none {
            return Ok(value);
        }
        let value = self.kind.validate(self, obj, value)?;
        if obj.is_cross_validation_locked() {
            Ok(value)
        } else {
            self.cross_validate(obj, value)
        }
    }

    /// Runs the object's cross-validator registered for this trait's name.
    pub(crate) fn cross_validate(&self, obj: &HasTraits, value: Value) -> Result<Value, TraitError> {
        let Some(name) = self.name() else {
            return Ok(value);
        };
        match obj.validator_for(name) {
            Some(validator) => validator.call(&Proposal {
                owner: obj.clone(),
                name: name.to_owned(),
                value,
            }),
            None => Ok(value),
        }
    }

    pub(crate) fn validate_mutation(
        self: &Rc<Self>,
        obj: &HasTraits,
        value: &Value,
    ) -> Result<(), TraitError> {
        self.kind.validate_mutation(self, obj, value)
    }

    /// Builds the standard validation error for a rejected value.
    #[must_use]
    pub fn error(&self, obj: &HasTraits, value: &Value) -> TraitError {
        TraitError::Validation {
            subject: self.subject(obj, true),
            expected: self.info(),
            value: describe(Article::The, value),
        }
    }

    /// "The 'x' trait of a Foo instance", or "An element of ..." for
    /// nested traits.
    pub(crate) fn subject(&self, obj: &HasTraits, capital: bool) -> String {
        let owner = add_article(obj.class().name(), false, false);
        match self.binding.get() {
            Some(b) if b.depth == 0 => {
                let the = if capital { "The" } else { "the" };
                format!("{the} '{}' trait of {owner} instance", b.absolute_name)
            }
            Some(b) => {
                let an = if capital { "An" } else { "an" };
                format!("{an} element of the '{}' trait of {owner} instance", b.absolute_name)
            }
            None => add_article(&format!("{} trait", self.type_name()), true, capital),
        }
    }

    /// Top-level attribute name and nesting depth, for mutation events.
    pub(crate) fn lineage(&self) -> (String, usize) {
        self.binding
            .get()
            .map_or_else(|| (String::new(), 0), |b| (b.absolute_name.clone(), b.depth))
    }

    /// This trait followed by every trait nested inside it, at any depth.
    pub(crate) fn with_nested(self: &Rc<Self>) -> Vec<Rc<Self>> {
        let mut tree = vec![Rc::clone(self)];
        let mut next = 0;
        while let Some(current) = tree.get(next) {
            let nested = current.kind.nested();
            tree.extend(nested);
            next += 1;
        }
        tree
    }

    pub(crate) fn is_declared_by(&self, class: &Rc<ClassInner>) -> bool {
        self.binding
            .get()
            .is_some_and(|b| std::ptr::eq(b.class.as_ptr(), Rc::as_ptr(class)))
    }

    /// Binds the trait to its class. The first binding wins; nested traits
    /// are bound under the same top-level name.
    pub(crate) fn bind(
        &self,
        class: &Weak<ClassInner>,
        class_name: &str,
        name: Option<&str>,
        parent: Option<(&str, usize)>,
    ) {
        let (absolute_name, depth) = parent.map_or_else(
            || (name.unwrap_or_default().to_owned(), 0),
            |(absolute, depth)| (absolute.to_owned(), depth),
        );
        let binding = Binding {
            class: class.clone(),
            class_name: class_name.to_owned(),
            name: name.map(str::to_owned),
            absolute_name,
            depth,
        };
        if self.binding.set(binding).is_err() {
            return;
        }
        let Some(bound) = self.binding.get() else {
            return;
        };
        let step = usize::from(self.kind.nests_elements());
        for child in self.kind.nested() {
            child.bind(
                class,
                class_name,
                None,
                Some((&bound.absolute_name, bound.depth + step)),
            );
        }
    }

    pub(crate) fn instance_init(&self, obj: &HasTraits) -> Result<(), TraitError> {
        self.kind.instance_init(self, obj)?;
        for child in self.kind.nested() {
            child.instance_init(obj)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TraitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitType")
            .field("kind", &self.kind.type_name())
            .field("name", &self.name())
            .field("allow_none", &self.allow_none)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

/// Fluent options shared by every trait, available on kinds and on
/// already-built [`TraitType`]s alike.
pub trait TraitBuilder: Sized {
    /// Finishes the kind into a descriptor.
    fn into_trait(self) -> TraitType;

    /// Sets a static default value.
    #[must_use]
    fn default_value(self, value: impl Into<Value>) -> TraitType {
        let mut t = self.into_trait();
        t.default = DefaultSource::Static(value.into());
        t
    }

    /// Sets a default computed from the instance on first read.
    #[must_use]
    fn dynamic_default(
        self,
        generate: impl Fn(&HasTraits) -> Result<Value, TraitError> + 'static,
    ) -> TraitType {
        let mut t = self.into_trait();
        t.default = DefaultSource::Dynamic(Rc::new(generate));
        t
    }

    #[must_use]
    fn allow_none(self, allow: bool) -> TraitType {
        let mut t = self.into_trait();
        t.allow_none = allow;
        t
    }

    #[must_use]
    fn read_only(self, read_only: bool) -> TraitType {
        let mut t = self.into_trait();
        t.read_only = read_only;
        t
    }

    #[must_use]
    fn help(self, help: impl Into<String>) -> TraitType {
        let mut t = self.into_trait();
        t.help = help.into();
        t
    }

    /// Attaches a metadata entry.
    #[must_use]
    fn tag(self, key: impl Into<String>, value: impl Into<Value>) -> TraitType {
        let mut t = self.into_trait();
        t.metadata.insert(key.into(), value.into());
        t
    }

    /// Shorthand for `tag("config", true)`.
    #[must_use]
    fn config(self) -> TraitType {
        self.tag("config", true)
    }
}

impl<K: TraitKind + 'static> TraitBuilder for K {
    fn into_trait(self) -> TraitType {
        TraitType::new(self)
    }
}

impl TraitBuilder for TraitType {
    fn into_trait(self) -> TraitType {
        self
    }
}

impl<T: TraitBuilder> BitOr<T> for TraitType {
    type Output = Self;

    fn bitor(self, rhs: T) -> Self {
        Self::new(Union::new(vec![self, rhs.into_trait()]))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
