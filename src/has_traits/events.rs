//! Change records, observers and cross-validators.

use std::fmt;
use std::rc::Rc;

use crate::eventful::Delta;
use crate::trait_types::TraitError;
use crate::value::Value;

use super::HasTraits;

/// The kind of a change notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A trait's value was replaced.
    Change,
    /// A trait's default was materialized on first read.
    Default,
    /// An eventful container was mutated in place.
    Mutation,
    /// A user-defined event type.
    Other(String),
}

impl EventType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Change => "change",
            Self::Default => "default",
            Self::Mutation => "mutation",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which event types an observer receives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventFilter {
    All,
    Only(EventType),
}

impl From<EventType> for EventFilter {
    fn from(event_type: EventType) -> Self {
        Self::Only(event_type)
    }
}

impl EventFilter {
    pub(crate) fn key(&self) -> Option<EventType> {
        match self {
            Self::All => None,
            Self::Only(t) => Some(t.clone()),
        }
    }
}

/// Which trait names an observer or validator applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Names {
    All,
    Only(Vec<String>),
}

impl Names {
    /// One key per listed name, or the single wildcard key.
    pub(crate) fn keys(&self) -> Vec<Option<String>> {
        match self {
            Self::All => vec![None],
            Self::Only(names) => names.iter().cloned().map(Some).collect(),
        }
    }
}

impl From<&str> for Names {
    fn from(name: &str) -> Self {
        Self::Only(vec![name.to_owned()])
    }
}

impl From<String> for Names {
    fn from(name: String) -> Self {
        Self::Only(vec![name])
    }
}

impl<const N: usize> From<[&str; N]> for Names {
    fn from(names: [&str; N]) -> Self {
        Self::Only(names.iter().map(|&n| n.to_owned()).collect())
    }
}

impl From<Vec<String>> for Names {
    fn from(names: Vec<String>) -> Self {
        Self::Only(names)
    }
}

/// A change notification delivered to observers.
///
/// `old` is `Undefined` for default events; `depth` and `events` are only
/// meaningful for mutation events.
#[derive(Debug, Clone)]
pub struct Change {
    pub name: String,
    pub event_type: EventType,
    pub owner: HasTraits,
    pub old: Value,
    pub new: Value,
    pub depth: usize,
    pub events: Vec<Delta>,
}

impl Change {
    /// A `"change"` event.
    #[must_use]
    pub fn changed(owner: &HasTraits, name: impl Into<String>, old: Value, new: Value) -> Self {
        Self {
            name: name.into(),
            event_type: EventType::Change,
            owner: owner.clone(),
            old,
            new,
            depth: 0,
            events: Vec::new(),
        }
    }

    /// A `"default"` event.
    #[must_use]
    pub fn default_value(owner: &HasTraits, name: impl Into<String>, value: Value) -> Self {
        Self {
            event_type: EventType::Default,
            ..Self::changed(owner, name, Value::undefined(), value)
        }
    }

    /// A `"mutation"` event carrying a batch of deltas. `old` and `new`
    /// both refer to the mutated container.
    #[must_use]
    pub fn mutation(
        owner: &HasTraits,
        name: impl Into<String>,
        depth: usize,
        events: Vec<Delta>,
        container: Value,
    ) -> Self {
        Self {
            event_type: EventType::Mutation,
            depth,
            events,
            ..Self::changed(owner, name, container.clone(), container)
        }
    }

    /// A user-defined event with no old value.
    #[must_use]
    pub fn custom(
        owner: &HasTraits,
        name: impl Into<String>,
        event_type: impl Into<String>,
        new: Value,
    ) -> Self {
        Self {
            event_type: EventType::Other(event_type.into()),
            ..Self::changed(owner, name, Value::undefined(), new)
        }
    }
}

type ObserverFn = dyn Fn(&Change) -> Result<(), TraitError>;

/// A change handler. Handles compare by identity, so the value returned
/// from `observe` is what `unobserve` expects back.
#[derive(Clone)]
pub struct Observer(Rc<ObserverFn>);

impl Observer {
    pub fn new(handler: impl Fn(&Change) -> Result<(), TraitError> + 'static) -> Self {
        Self(Rc::new(handler))
    }

    /// Runs the handler.
    ///
    /// # Errors
    ///
    /// Propagates the handler's error.
    pub fn call(&self, change: &Change) -> Result<(), TraitError> {
        (self.0)(change)
    }
}

impl PartialEq for Observer {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observer({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// A proposed value awaiting cross-validation.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub owner: HasTraits,
    pub name: String,
    pub value: Value,
}

type ValidatorFn = dyn Fn(&Proposal) -> Result<Value, TraitError>;

/// A cross-validator: receives the proposal and returns the value to store.
#[derive(Clone)]
pub struct Validator(Rc<ValidatorFn>);

impl Validator {
    pub fn new(validate: impl Fn(&Proposal) -> Result<Value, TraitError> + 'static) -> Self {
        Self(Rc::new(validate))
    }

    /// Runs the validator.
    ///
    /// # Errors
    ///
    /// Propagates the validator's rejection.
    pub fn call(&self, proposal: &Proposal) -> Result<Value, TraitError> {
        (self.0)(proposal)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}
