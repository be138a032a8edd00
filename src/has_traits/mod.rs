//! The object model: instances of classes carrying validated, observable
//! trait values.
//!
//! A [`HasTraits`] is a cheap, shared handle to one instance. Values are
//! materialized lazily: nothing is stored until a trait is first read (its
//! default is computed, validated and stored) or written.
//!
//! Observers and cross-validators run with no internal borrow held, so they
//! may freely read and write the object that notified them.

mod class;
mod configurable;
mod events;
mod hold;
mod link;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::describe::add_article;
use crate::trait_types::{TraitError, TraitType};
use crate::value::Value;

pub use class::{Class, ClassBuilder, ClassInner};
pub use events::{Change, EventFilter, EventType, Names, Observer, Proposal, Validator};
pub use link::{Link, Transform, directional_link, link, link_with};

use hold::{Hold, Pending};

type ObserverKey = (Option<String>, Option<EventType>);

struct ObjectState {
    class: Class,
    values: IndexMap<String, Value>,
    observers: HashMap<ObserverKey, Vec<Observer>>,
    validators: HashMap<String, Validator>,
    cross_validation_locked: bool,
    hold: Option<Hold>,
}

/// A handle to an instance. Cloning shares the instance; equality of
/// `Value::Object`s is identity.
#[derive(Clone)]
pub struct HasTraits(Rc<RefCell<ObjectState>>);

/// A non-owning handle, used by eventful hooks and links.
#[derive(Clone)]
pub struct WeakHasTraits(Weak<RefCell<ObjectState>>);

impl WeakHasTraits {
    #[must_use]
    pub fn upgrade(&self) -> Option<HasTraits> {
        self.0.upgrade().map(HasTraits)
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// True when this handle refers to `obj`.
    #[must_use]
    pub fn points_to(&self, obj: &HasTraits) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&obj.0))
    }
}

/// Restores the previous cross-validation lock state on every exit path.
struct LockGuard<'a> {
    obj: &'a HasTraits,
    previous: bool,
}

impl<'a> LockGuard<'a> {
    fn acquire(obj: &'a HasTraits) -> Self {
        let previous = std::mem::replace(&mut obj.0.borrow_mut().cross_validation_locked, true);
        Self { obj, previous }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.obj.0.try_borrow_mut() {
            state.cross_validation_locked = self.previous;
        }
    }
}

/// Closes a hold region on every exit path.
struct HoldGuard<'a> {
    obj: &'a HasTraits,
}

impl<'a> HoldGuard<'a> {
    fn open(obj: &'a HasTraits) -> Self {
        let mut state = obj.0.borrow_mut();
        state.cross_validation_locked = true;
        state.hold = Some(Hold::Collecting(Pending::default()));
        drop(state);
        Self { obj }
    }
}

impl Drop for HoldGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.obj.0.try_borrow_mut() {
            state.cross_validation_locked = false;
            state.hold = None;
        }
    }
}

impl HasTraits {
    /// Creates an instance: installs the class's observers and validators,
    /// then runs per-instance setup for every trait.
    ///
    /// # Errors
    ///
    /// Fails when a trait's instance setup fails, e.g. a forward class
    /// name that cannot be resolved.
    pub fn new(class: &Class) -> Result<Self, TraitError> {
        let obj = Self(Rc::new(RefCell::new(ObjectState {
            class: class.clone(),
            values: IndexMap::new(),
            observers: HashMap::new(),
            validators: HashMap::new(),
            cross_validation_locked: false,
            hold: None,
        })));
        obj.install_class_handlers();
        for t in class.traits().values() {
            t.instance_init(&obj)?;
        }
        Ok(obj)
    }

    /// Creates an instance and assigns `kwargs` inside one hold region.
    /// Read-only traits may be initialized this way.
    ///
    /// # Errors
    ///
    /// Fails on instance setup, unknown names or rejected values; nothing
    /// is notified in that case.
    pub fn with_values<K: Into<String>, V: Into<Value>>(
        class: &Class,
        kwargs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, TraitError> {
        let obj = Self::new(class)?;
        obj.hold_trait_notifications(|| {
            for (name, value) in kwargs {
                let name: String = name.into();
                obj.set_trait(&name, value)?;
            }
            Ok(())
        })?;
        Ok(obj)
    }

    fn install_class_handlers(&self) {
        let class = self.class();
        let trait_names = self.trait_names();
        let mut state = self.0.borrow_mut();
        // Most derived validator wins for a name.
        for c in class.mro() {
            for (names, validator) in c.validators() {
                let keys = match names {
                    Names::All => trait_names.clone(),
                    Names::Only(names) => names.clone(),
                };
                for name in keys {
                    state
                        .validators
                        .entry(name)
                        .or_insert_with(|| validator.clone());
                }
            }
        }
        for c in class.mro().iter().rev() {
            for (names, filter, observer) in c.observers() {
                for name in names.keys() {
                    state
                        .observers
                        .entry((name, filter.key()))
                        .or_default()
                        .push(observer.clone());
                }
            }
        }
    }

    #[must_use]
    pub fn class(&self) -> Class {
        self.0.borrow().class.clone()
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakHasTraits {
        WeakHasTraits(Rc::downgrade(&self.0))
    }

    /// True when both handles refer to one instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    fn trait_for(&self, name: &str) -> Result<Rc<TraitType>, TraitError> {
        let class = self.class();
        class
            .trait_named(name)
            .ok_or_else(|| TraitError::unknown_trait(class.name(), name))
    }

    #[must_use]
    pub fn has_trait(&self, name: &str) -> bool {
        self.class().has_trait(name)
    }

    /// True once the trait has been read or written.
    #[must_use]
    pub fn trait_has_value(&self, name: &str) -> bool {
        self.0.borrow().values.contains_key(name)
    }

    #[must_use]
    pub fn trait_names(&self) -> Vec<String> {
        self.class().traits().keys().cloned().collect()
    }

    #[must_use]
    pub fn traits(&self) -> IndexMap<String, Rc<TraitType>> {
        self.class().traits()
    }

    /// One metadata entry of a trait.
    ///
    /// # Errors
    ///
    /// Fails for unknown trait names.
    pub fn trait_metadata(&self, name: &str, key: &str) -> Result<Option<Value>, TraitError> {
        Ok(self.trait_for(name)?.metadata(key).cloned())
    }

    /// Reads every trait, materializing defaults as needed.
    ///
    /// # Errors
    ///
    /// Fails when a default cannot be produced or validated.
    pub fn trait_values(&self) -> Result<IndexMap<String, Value>, TraitError> {
        self.trait_names()
            .into_iter()
            .map(|name| self.get(&name).map(|value| (name, value)))
            .collect()
    }

    /// The default of every trait that has one, without storing anything.
    ///
    /// # Errors
    ///
    /// Fails when a default generator fails.
    pub fn trait_defaults(&self) -> Result<IndexMap<String, Value>, TraitError> {
        let mut defaults = IndexMap::new();
        for name in self.trait_names() {
            match self.trait_default(&name) {
                Ok(value) => {
                    defaults.insert(name, value);
                }
                Err(TraitError::NoDefault { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(defaults)
    }

    /// Traits whose metadata has `key` set to `value`.
    #[must_use]
    pub fn traits_tagged(&self, key: &str, value: &Value) -> IndexMap<String, Rc<TraitType>> {
        self.class().traits_tagged(key, value)
    }

    /// Computes the default `name` would take, without validating or
    /// storing it.
    ///
    /// Generators registered on the class chain are searched from the most
    /// derived class up to the class declaring the trait; the trait's own
    /// default applies when none is found.
    ///
    /// # Errors
    ///
    /// Fails for unknown names, failing generators, and traits with no
    /// default at all.
    pub fn trait_default(&self, name: &str) -> Result<Value, TraitError> {
        let t = self.trait_for(name)?;
        let class = self.class();
        let generator = class
            .mro()
            .into_iter()
            .scan(false, |declared, c| {
                if *declared {
                    return None;
                }
                *declared = t.is_declared_by(c.inner());
                Some(c.default_for(name))
            })
            .flatten()
            .next();
        let value = match generator {
            Some(generate) => generate(self)?,
            None => t.make_default(self)?,
        };
        if value.is_undefined() {
            return Err(TraitError::NoDefault {
                kind: t.type_name(),
                name: name.to_owned(),
                owner: add_article(class.name(), false, false),
            });
        }
        Ok(value)
    }

    /// Reads a trait, materializing its default on first read.
    ///
    /// # Errors
    ///
    /// Fails for unknown names, or when the default cannot be produced or
    /// validated.
    pub fn get(&self, name: &str) -> Result<Value, TraitError> {
        let t = self.trait_for(name)?;
        if let Some(value) = self.0.borrow().values.get(name) {
            return Ok(value.clone());
        }
        let default = self.trait_default(name)?;
        let value = self.cross_validation_lock(|| t.validate(self, default))?;
        self.0
            .borrow_mut()
            .values
            .insert(name.to_owned(), value.clone());
        self.notify_observers(&Change::default_value(self, name, value.clone()))?;
        Ok(value)
    }

    /// Assigns a trait through validation and cross-validation, notifying
    /// a `"change"` when the value differs from the previous one.
    ///
    /// # Errors
    ///
    /// Fails for unknown names, read-only traits, rejected values and
    /// failing observers.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), TraitError> {
        let t = self.trait_for(name)?;
        if t.is_read_only() {
            return Err(TraitError::read_only(name));
        }
        self.assign(name, &t, value.into())
    }

    /// Like [`HasTraits::set`], but also writes read-only traits.
    ///
    /// # Errors
    ///
    /// Fails for unknown names, rejected values and failing observers.
    pub fn set_trait(&self, name: &str, value: impl Into<Value>) -> Result<(), TraitError> {
        let t = self.trait_for(name)?;
        self.assign(name, &t, value.into())
    }

    fn assign(&self, name: &str, t: &Rc<TraitType>, value: Value) -> Result<(), TraitError> {
        if t.is_eventful() && matches!(value, Value::List(_) | Value::Set(_) | Value::Dict(_)) {
            return Err(TraitError::RawBuiltin {
                subject: t.subject(self, true),
                kind: value.kind().type_name(),
                value: value.to_string(),
            });
        }
        let new = t.validate(self, value)?;
        let previous = {
            let mut state = self.0.borrow_mut();
            let previous = state.values.get(name).cloned();
            if let Some(Hold::Collecting(pending)) = &mut state.hold {
                pending.record_prior(name, previous.clone());
            }
            state.values.insert(name.to_owned(), new.clone());
            previous
        };
        if let Some(Value::Eventful(old)) = &previous {
            old.detach(self, t, &new);
        }
        let old = previous.unwrap_or_else(|| t.static_default());
        if old == new {
            return Ok(());
        }
        self.notify_change(Change::changed(self, name, old, new))
    }

    /// Removes a stored value, detaching eventful hooks. The next read
    /// materializes the default again.
    fn forget(&self, name: &str) {
        let removed = self.0.borrow_mut().values.shift_remove(name);
        if let (Some(Value::Eventful(container)), Ok(t)) = (removed, self.trait_for(name)) {
            container.detach(self, &t, &Value::None);
        }
    }

    /// Registers `handler` for changes to `names` of the filtered types and
    /// returns the handle [`HasTraits::unobserve`] expects.
    pub fn observe(
        &self,
        names: impl Into<Names>,
        filter: impl Into<EventFilter>,
        handler: impl Fn(&Change) -> Result<(), TraitError> + 'static,
    ) -> Observer {
        let observer = Observer::new(handler);
        self.add_observer(&observer, names, filter);
        observer
    }

    /// Registers an existing handler. Registering it twice for the same
    /// name and type has no effect.
    pub fn add_observer(
        &self,
        observer: &Observer,
        names: impl Into<Names>,
        filter: impl Into<EventFilter>,
    ) {
        let filter = filter.into();
        let mut state = self.0.borrow_mut();
        for name in names.into().keys() {
            let handlers = state.observers.entry((name, filter.key())).or_default();
            if !handlers.contains(observer) {
                handlers.push(observer.clone());
            }
        }
    }

    /// Removes a handler.
    ///
    /// # Errors
    ///
    /// Fails when the handler was not registered for one of the names.
    pub fn unobserve(
        &self,
        observer: &Observer,
        names: impl Into<Names>,
        filter: impl Into<EventFilter>,
    ) -> Result<(), TraitError> {
        let filter = filter.into();
        let mut state = self.0.borrow_mut();
        for name in names.into().keys() {
            let label = name.clone().unwrap_or_else(|| "All".to_owned());
            let handlers = state
                .observers
                .get_mut(&(name, filter.key()))
                .ok_or_else(|| TraitError::Missing(format!("observer of '{label}'")))?;
            let before = handlers.len();
            handlers.retain(|h| h != observer);
            if handlers.len() == before {
                return Err(TraitError::Missing(format!("observer of '{label}'")));
            }
        }
        Ok(())
    }

    /// Removes every handler for `name`, or every handler at all.
    pub fn unobserve_all(&self, name: Option<&str>) {
        let mut state = self.0.borrow_mut();
        match name {
            Some(name) => state.observers.retain(|(n, _), _| n.as_deref() != Some(name)),
            None => state.observers.clear(),
        }
    }

    /// Registers a cross-validator for `names`.
    ///
    /// # Errors
    ///
    /// Fails when one of the names already has a validator; nothing is
    /// registered in that case.
    pub fn register_validator(
        &self,
        names: impl Into<Names>,
        validator: Validator,
    ) -> Result<(), TraitError> {
        let names = match names.into() {
            Names::All => self.trait_names(),
            Names::Only(names) => names,
        };
        let class = self.class();
        let mut state = self.0.borrow_mut();
        if let Some(taken) = names.iter().find(|n| state.validators.contains_key(*n)) {
            return Err(TraitError::DuplicateValidator {
                class: class.name().to_owned(),
                name: taken.clone(),
            });
        }
        for name in names {
            state.validators.insert(name, validator.clone());
        }
        Ok(())
    }

    pub(crate) fn validator_for(&self, name: &str) -> Option<Validator> {
        self.0.borrow().validators.get(name).cloned()
    }

    #[must_use]
    pub fn is_cross_validation_locked(&self) -> bool {
        self.0.borrow().cross_validation_locked
    }

    /// Runs `body` with cross-validation suspended.
    pub fn cross_validation_lock<R>(&self, body: impl FnOnce() -> R) -> R {
        let _guard = LockGuard::acquire(self);
        body()
    }

    /// Runs `body` with notifications held.
    ///
    /// Changes made by `body` are compressed per name. When `body` returns,
    /// each touched trait is cross-validated once against its final value;
    /// then the held notifications are delivered in first-touch order. If
    /// `body` or a cross-validator fails, every assigned trait reverts to
    /// its value from before the region, nothing is notified, and the error
    /// is returned. Nested calls run `body` directly.
    ///
    /// # Errors
    ///
    /// Returns the first error from `body`, the cross-validation pass, or a
    /// notified observer.
    pub fn hold_trait_notifications<R>(
        &self,
        body: impl FnOnce() -> Result<R, TraitError>,
    ) -> Result<R, TraitError> {
        if self.is_cross_validation_locked() {
            return body();
        }
        let guard = HoldGuard::open(self);
        let result = body().and_then(|r| self.commit_held().map(|()| r));
        if result.is_err() {
            self.roll_back();
        }
        let held = self.0.borrow_mut().hold.take();
        drop(guard);
        let r = result?;
        if let Some(Hold::Collecting(pending)) = held {
            for change in pending.into_changes() {
                self.notify_observers(&change)?;
            }
        }
        Ok(r)
    }

    fn commit_held(&self) -> Result<(), TraitError> {
        let names = match &self.0.borrow().hold {
            Some(Hold::Collecting(pending)) => pending.changed_names(),
            _ => Vec::new(),
        };
        let class = self.class();
        for name in names {
            let Some(t) = class.trait_named(&name) else {
                continue;
            };
            let value = self.get(&name)?;
            let value = t.cross_validate(self, value)?;
            self.set_trait(&name, value)?;
        }
        Ok(())
    }

    fn roll_back(&self) {
        let priors = match self.0.borrow_mut().hold.replace(Hold::Discarding) {
            Some(Hold::Collecting(pending)) => pending.priors(),
            _ => Vec::new(),
        };
        for (name, prior) in priors {
            match prior {
                Some(value) => {
                    if let Err(error) = self.set_trait(&name, value) {
                        tracing::warn!(trait_name = %name, %error, "Failed to restore trait value");
                    }
                }
                None => self.forget(&name),
            }
        }
    }

    /// Delivers a change, or queues it while notifications are held.
    ///
    /// # Errors
    ///
    /// Returns the first observer error.
    pub fn notify_change(&self, change: Change) -> Result<(), TraitError> {
        {
            let mut state = self.0.borrow_mut();
            match &mut state.hold {
                Some(Hold::Collecting(pending)) => {
                    pending.push(change);
                    return Ok(());
                }
                Some(Hold::Discarding) => return Ok(()),
                None => {}
            }
        }
        self.notify_observers(&change)
    }

    /// Calls observers for `(name, type)`, `(name, All)`, `(All, type)` and
    /// `(All, All)`, in that order.
    fn notify_observers(&self, change: &Change) -> Result<(), TraitError> {
        let handlers: Vec<Observer> = {
            let state = self.0.borrow();
            let name = Some(change.name.clone());
            let event_type = Some(change.event_type.clone());
            [
                (name.clone(), event_type.clone()),
                (name, None),
                (None, event_type),
                (None, None),
            ]
            .iter()
            .filter_map(|key| state.observers.get(key))
            .flatten()
            .cloned()
            .collect()
        };
        for handler in &handlers {
            handler.call(change)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HasTraits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(state) => f
                .debug_struct("HasTraits")
                .field("class", &state.class.name())
                .field("values", &state.values)
                .finish_non_exhaustive(),
            Err(_) => f.write_str("HasTraits(<borrowed>)"),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
