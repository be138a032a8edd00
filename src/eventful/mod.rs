//! Eventful containers.
//!
//! An eventful container owns a list, set or dict and reports every
//! in-place mutation as a batch of [`Delta`] records. Each outer method call
//! produces at most one batch; a call that changes nothing produces none.
//!
//! Containers start detached. When one is stored in an eventful trait, the
//! trait attaches a hook naming the owning object; every batch is then
//! delivered to that object as a single `"mutation"` change, and the
//! container is re-validated against the trait's element types. A rejected
//! mutation is undone. Replacing the trait's value detaches the old
//! container, and any eventful containers nested in it, from the owner.

mod dict;
mod list;
mod set;

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::has_traits::{Change, HasTraits, WeakHasTraits};
use crate::trait_types::{TraitError, TraitType};
use crate::value::{Value, ValueKind, ValueMap, ValueSet};

pub use dict::EventfulDict;
pub use list::EventfulList;
pub use set::EventfulSet;

/// One structured change inside a mutation batch.
///
/// `Undefined` in `old` or `new` marks a position or key that did not
/// exist before or after the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// A list position changed.
    Index { index: usize, old: Value, new: Value },
    /// A dict entry changed.
    Key { key: Value, old: Value, new: Value },
    /// Set membership changed.
    Members { added: ValueSet, removed: ValueSet },
}

/// Routes a container's mutation batches to one trait on one object.
#[derive(Clone)]
pub(crate) struct Hook {
    owner: WeakHasTraits,
    trait_type: Rc<TraitType>,
}

impl Hook {
    fn is_for(&self, owner: &HasTraits, trait_type: &Rc<TraitType>) -> bool {
        self.owner.points_to(owner) && Rc::ptr_eq(&self.trait_type, trait_type)
    }

    fn send(&self, container: &Eventful, deltas: &[Delta]) -> Result<(), TraitError> {
        let Some(owner) = self.owner.upgrade() else {
            return Ok(());
        };
        let (name, depth) = self.trait_type.lineage();
        let value = Value::Eventful(container.clone());
        owner.hold_trait_notifications(|| {
            owner.notify_change(Change::mutation(
                &owner,
                name,
                depth,
                deltas.to_vec(),
                value.clone(),
            ))?;
            self.trait_type.validate_mutation(&owner, &value)
        })
    }
}

/// Container contents that may hold other eventful containers.
trait Contents: Clone {
    /// The eventful containers stored directly inside.
    fn children(&self) -> Vec<Eventful>;
}

fn eventful_among<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<Eventful> {
    values.filter_map(Value::as_eventful).cloned().collect()
}

impl Contents for Vec<Value> {
    fn children(&self) -> Vec<Eventful> {
        eventful_among(self.iter())
    }
}

impl Contents for ValueSet {
    fn children(&self) -> Vec<Eventful> {
        eventful_among(self.iter())
    }
}

impl Contents for ValueMap {
    fn children(&self) -> Vec<Eventful> {
        eventful_among(self.values())
    }
}

/// Containers in `from` that are not also in `kept`.
fn dropped(from: Vec<Eventful>, kept: &[Eventful]) -> Vec<Eventful> {
    from.into_iter()
        .filter(|c| !kept.iter().any(|k| k.ptr_eq(c)))
        .collect()
}

/// Shared storage behind every eventful handle.
struct Watched<C> {
    data: RefCell<C>,
    hooks: RefCell<Vec<Hook>>,
}

impl<C: Contents> Watched<C> {
    const fn new(data: C) -> Self {
        Self {
            data: RefCell::new(data),
            hooks: RefCell::new(Vec::new()),
        }
    }

    fn add_hook(&self, owner: &HasTraits, trait_type: &Rc<TraitType>) {
        let mut hooks = self.hooks.borrow_mut();
        hooks.retain(|h| h.owner.is_alive());
        if !hooks.iter().any(|h| h.is_for(owner, trait_type)) {
            hooks.push(Hook {
                owner: owner.downgrade(),
                trait_type: Rc::clone(trait_type),
            });
        }
    }

    fn remove_hooks(&self, owner: &HasTraits, traits: &[Rc<TraitType>]) {
        self.hooks
            .borrow_mut()
            .retain(|h| h.owner.is_alive() && !traits.iter().any(|t| h.is_for(owner, t)));
    }

    fn dispatch(&self, container: &Eventful, deltas: &[Delta]) -> Result<(), TraitError> {
        if deltas.is_empty() {
            return Ok(());
        }
        let hooks = self.hooks.borrow().clone();
        for hook in &hooks {
            hook.send(container, deltas)?;
        }
        Ok(())
    }

    /// Reports a mutation already applied to `data`. When an observer or
    /// the owning trait rejects it, `before` is restored without further
    /// events. Nested containers that left the contents either way are
    /// detached from this container's owners.
    fn commit(&self, container: &Eventful, before: C, deltas: &[Delta]) -> Result<(), TraitError> {
        let result = self.dispatch(container, deltas);
        let gone = if result.is_ok() {
            dropped(before.children(), &self.data.borrow().children())
        } else {
            let rejected = self.data.replace(before);
            dropped(rejected.children(), &self.data.borrow().children())
        };
        if !gone.is_empty() {
            self.release(container, &gone);
        }
        result
    }

    /// Detaches `gone` from every owner this container reports to, except
    /// for containers still reachable from `container`.
    fn release(&self, container: &Eventful, gone: &[Eventful]) {
        let mut kept = HashSet::new();
        container.reach(&mut kept);
        let hooks = self.hooks.borrow().clone();
        for hook in &hooks {
            let Some(owner) = hook.owner.upgrade() else {
                continue;
            };
            let traits = hook.trait_type.with_nested();
            for child in gone {
                child.detach_from(&owner, &traits, &mut kept.clone());
            }
        }
    }
}

/// A handle to an eventful list, set or dict.
///
/// Cloning the handle shares the container.
#[derive(Clone)]
pub enum Eventful {
    List(EventfulList),
    Set(EventfulSet),
    Dict(EventfulDict),
}

impl Eventful {
    /// Wraps a plain list, set or dict. Other values are not containers
    /// and yield `None`.
    #[must_use]
    pub fn wrap(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(Self::List(EventfulList::new(items.clone()))),
            Value::Set(items) => Some(Self::Set(EventfulSet::new(items.clone()))),
            Value::Dict(map) => Some(Self::Dict(EventfulDict::new(map.clone()))),
            _ => None,
        }
    }

    /// The kind of the wrapped container.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::List(_) => ValueKind::List,
            Self::Set(_) => ValueKind::Set,
            Self::Dict(_) => ValueKind::Dict,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(l) => l.len(),
            Self::Set(s) => s.len(),
            Self::Dict(d) => d.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A plain copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        match self {
            Self::List(l) => Value::List(l.to_vec()),
            Self::Set(s) => Value::Set(s.to_set()),
            Self::Dict(d) => Value::Dict(d.to_map()),
        }
    }

    /// A new, detached container holding a deep copy of the contents.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        match self.snapshot().deep_copy() {
            Value::List(items) => Self::List(EventfulList::new(items)),
            Value::Set(items) => Self::Set(EventfulSet::new(items)),
            Value::Dict(map) => Self::Dict(EventfulDict::new(map)),
            _ => self.clone(),
        }
    }

    /// True when both handles share one container.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }

    pub(crate) fn addr(&self) -> usize {
        match self {
            Self::List(l) => Rc::as_ptr(&l.0).cast::<()>() as usize,
            Self::Set(s) => Rc::as_ptr(&s.0).cast::<()>() as usize,
            Self::Dict(d) => Rc::as_ptr(&d.0).cast::<()>() as usize,
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&EventfulList> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_set(&self) -> Option<&EventfulSet> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_dict(&self) -> Option<&EventfulDict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Replaces the contents without reporting a mutation. Used when
    /// validation coerces elements of a container that is being assigned.
    pub(crate) fn overwrite(&self, contents: Value) {
        match (self, contents) {
            (Self::List(l), Value::List(items)) => *l.0.data.borrow_mut() = items,
            (Self::Set(s), Value::Set(items)) => *s.0.data.borrow_mut() = items,
            (Self::Dict(d), Value::Dict(map)) => *d.0.data.borrow_mut() = map,
            _ => {}
        }
    }

    pub(crate) fn add_hook(&self, owner: &HasTraits, trait_type: &Rc<TraitType>) {
        match self {
            Self::List(l) => l.0.add_hook(owner, trait_type),
            Self::Set(s) => s.0.add_hook(owner, trait_type),
            Self::Dict(d) => d.0.add_hook(owner, trait_type),
        }
    }

    /// Detaches `owner`'s hook for `trait_type`, and the hooks its nested
    /// traits placed on eventful elements, at any depth. Containers
    /// reachable from `kept` stay attached.
    pub(crate) fn detach(&self, owner: &HasTraits, trait_type: &Rc<TraitType>, kept: &Value) {
        let mut seen = HashSet::new();
        if let Value::Eventful(kept) = kept {
            kept.reach(&mut seen);
        }
        self.detach_from(owner, &trait_type.with_nested(), &mut seen);
    }

    /// Adds this container and every eventful container inside it to `seen`.
    fn reach(&self, seen: &mut HashSet<usize>) {
        if seen.insert(self.addr()) {
            for child in self.children() {
                child.reach(seen);
            }
        }
    }

    fn children(&self) -> Vec<Self> {
        match self {
            Self::List(l) => l.0.data.borrow().children(),
            Self::Set(s) => s.0.data.borrow().children(),
            Self::Dict(d) => d.0.data.borrow().children(),
        }
    }

    fn detach_from(&self, owner: &HasTraits, traits: &[Rc<TraitType>], seen: &mut HashSet<usize>) {
        if !seen.insert(self.addr()) {
            return;
        }
        match self {
            Self::List(l) => l.0.remove_hooks(owner, traits),
            Self::Set(s) => s.0.remove_hooks(owner, traits),
            Self::Dict(d) => d.0.remove_hooks(owner, traits),
        }
        for child in self.children() {
            child.detach_from(owner, traits, seen);
        }
    }

    #[cfg(test)]
    pub(crate) fn hook_count(&self) -> usize {
        match self {
            Self::List(l) => l.0.hooks.borrow().len(),
            Self::Set(s) => s.0.hooks.borrow().len(),
            Self::Dict(d) => d.0.hooks.borrow().len(),
        }
    }
}

impl fmt::Debug for Eventful {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Eventful").field(&self.snapshot()).finish()
    }
}

impl From<EventfulList> for Value {
    fn from(list: EventfulList) -> Self {
        Self::Eventful(Eventful::List(list))
    }
}

impl From<EventfulSet> for Value {
    fn from(set: EventfulSet) -> Self {
        Self::Eventful(Eventful::Set(set))
    }
}

impl From<EventfulDict> for Value {
    fn from(dict: EventfulDict) -> Self {
        Self::Eventful(Eventful::Dict(dict))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
