//! Classes: named, ordered trait declarations with an optional base.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::trait_types::{DefaultFn, TraitBuilder, TraitError, TraitType};
use crate::value::Value;

use super::events::{Change, EventFilter, Names, Observer, Proposal, Validator};
use super::HasTraits;

thread_local! {
    static REGISTRY: RefCell<HashMap<String, Weak<ClassInner>>> = RefCell::new(HashMap::new());
}

/// Shared class data. Reach it through [`Class`].
pub struct ClassInner {
    name: String,
    base: Option<Class>,
    traits: IndexMap<String, Rc<TraitType>>,
    defaults: HashMap<String, DefaultFn>,
    validators: Vec<(Names, Validator)>,
    observers: Vec<(Names, EventFilter, Observer)>,
}

/// A handle to a class. Cloning shares the class; equality is identity.
#[derive(Clone)]
pub struct Class(Rc<ClassInner>);

impl Class {
    /// Starts declaring a class.
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            base: None,
            traits: IndexMap::new(),
            defaults: HashMap::new(),
            validators: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub(crate) const fn from_inner(inner: Rc<ClassInner>) -> Self {
        Self(inner)
    }

    pub(crate) const fn inner(&self) -> &Rc<ClassInner> {
        &self.0
    }

    /// Finds the most recently built live class with this name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        REGISTRY.with(|registry| {
            registry
                .borrow()
                .get(name)
                .and_then(Weak::upgrade)
                .map(Self)
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn base(&self) -> Option<&Self> {
        self.0.base.as_ref()
    }

    /// This class followed by its bases, most derived first.
    #[must_use]
    pub fn mro(&self) -> Vec<Self> {
        let mut chain = vec![self.clone()];
        let mut current = self.base();
        while let Some(class) = current {
            chain.push(class.clone());
            current = class.base();
        }
        chain
    }

    /// True when `other` is this class or one of its bases.
    #[must_use]
    pub fn is_subclass_of(&self, other: &Self) -> bool {
        self.mro().iter().any(|c| c == other)
    }

    /// Every trait, inherited first. A redeclared name keeps its inherited
    /// position and takes the derived declaration.
    #[must_use]
    pub fn traits(&self) -> IndexMap<String, Rc<TraitType>> {
        let mut traits = self
            .base()
            .map(Self::traits)
            .unwrap_or_default();
        for (name, t) in &self.0.traits {
            traits.insert(name.clone(), Rc::clone(t));
        }
        traits
    }

    /// The traits this class declares itself.
    #[must_use]
    pub fn own_traits(&self) -> &IndexMap<String, Rc<TraitType>> {
        &self.0.traits
    }

    #[must_use]
    pub fn trait_named(&self, name: &str) -> Option<Rc<TraitType>> {
        self.0
            .traits
            .get(name)
            .cloned()
            .or_else(|| self.base().and_then(|b| b.trait_named(name)))
    }

    #[must_use]
    pub fn has_trait(&self, name: &str) -> bool {
        self.trait_named(name).is_some()
    }

    /// Traits tagged `config=True`, in declaration order.
    #[must_use]
    pub fn configurable_traits(&self) -> IndexMap<String, Rc<TraitType>> {
        self.traits()
            .into_iter()
            .filter(|(_, t)| t.is_configurable())
            .collect()
    }

    /// Traits whose metadata has `key` set to `value`.
    #[must_use]
    pub fn traits_tagged(&self, key: &str, value: &Value) -> IndexMap<String, Rc<TraitType>> {
        self.traits()
            .into_iter()
            .filter(|(_, t)| t.metadata(key) == Some(value))
            .collect()
    }

    pub(crate) fn default_for(&self, name: &str) -> Option<DefaultFn> {
        self.0.defaults.get(name).cloned()
    }

    pub(crate) fn validators(&self) -> &[(Names, Validator)] {
        &self.0.validators
    }

    pub(crate) fn observers(&self) -> &[(Names, EventFilter, Observer)] {
        &self.0.observers
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.0.name)
            .field("traits", &self.0.traits.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Declares a class. Names given to `default`, `validate` and `observe`
/// refer to traits declared here or inherited.
pub struct ClassBuilder {
    name: String,
    base: Option<Class>,
    traits: IndexMap<String, TraitType>,
    defaults: HashMap<String, DefaultFn>,
    validators: Vec<(Names, Validator)>,
    observers: Vec<(Names, EventFilter, Observer)>,
}

impl ClassBuilder {
    /// Inherits traits, defaults, validators and observers from `base`.
    #[must_use]
    pub fn base(mut self, base: &Class) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Declares a trait. Redeclaring a name replaces the earlier declaration.
    #[must_use]
    pub fn add_trait(mut self, name: impl Into<String>, t: impl TraitBuilder) -> Self {
        self.traits.insert(name.into(), t.into_trait());
        self
    }

    /// Computes the default of `name` for each instance, overriding the
    /// trait's own default and any inherited generator.
    #[must_use]
    pub fn default(
        mut self,
        name: impl Into<String>,
        generate: impl Fn(&HasTraits) -> Result<Value, TraitError> + 'static,
    ) -> Self {
        self.defaults.insert(name.into(), Rc::new(generate));
        self
    }

    /// Registers a cross-validator installed on every instance.
    #[must_use]
    pub fn validate(
        mut self,
        names: impl Into<Names>,
        validate: impl Fn(&Proposal) -> Result<Value, TraitError> + 'static,
    ) -> Self {
        self.validators.push((names.into(), Validator::new(validate)));
        self
    }

    /// Registers an observer installed on every instance.
    #[must_use]
    pub fn observe(
        mut self,
        names: impl Into<Names>,
        filter: impl Into<EventFilter>,
        handler: impl Fn(&Change) -> Result<(), TraitError> + 'static,
    ) -> Self {
        self.observers
            .push((names.into(), filter.into(), Observer::new(handler)));
        self
    }

    /// Binds every trait to the new class and registers it by name.
    #[must_use]
    pub fn build(self) -> Class {
        let Self {
            name,
            base,
            traits,
            defaults,
            validators,
            observers,
        } = self;
        let inner = Rc::new_cyclic(|weak: &Weak<ClassInner>| {
            let traits = traits
                .into_iter()
                .map(|(trait_name, t)| {
                    t.bind(weak, &name, Some(&trait_name), None);
                    (trait_name, Rc::new(t))
                })
                .collect();
            ClassInner {
                name: name.clone(),
                base,
                traits,
                defaults,
                validators,
                observers,
            }
        });
        REGISTRY.with(|registry| {
            let mut registry = registry.borrow_mut();
            registry.retain(|_, class| class.strong_count() > 0);
            registry.insert(name, Rc::downgrade(&inner));
        });
        tracing::debug!(class = %inner.name, traits = inner.traits.len(), "Class built");
        Class(inner)
    }
}
