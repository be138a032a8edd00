//! Eventful set.

use std::rc::Rc;

use crate::trait_types::TraitError;
use crate::value::{Value, ValueSet};

use super::{Delta, Eventful, Watched};

/// A set that reports one `(added, removed)` delta per mutating call.
#[derive(Clone)]
pub struct EventfulSet(pub(super) Rc<Watched<ValueSet>>);

impl EventfulSet {
    /// Creates a detached set.
    pub fn new<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Self(Rc::new(Watched::new(
            items.into_iter().map(Into::into).collect(),
        )))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.data.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.0.data.borrow().contains(value)
    }

    /// A plain copy of the members.
    #[must_use]
    pub fn to_set(&self) -> ValueSet {
        self.0.data.borrow().clone()
    }

    fn mutate<R>(&self, op: impl FnOnce(&mut ValueSet) -> R) -> Result<R, TraitError> {
        let (result, before, delta) = {
            let mut data = self.0.data.borrow_mut();
            let before = data.clone();
            let result = op(&mut data);
            let added: ValueSet = data.difference(&before).cloned().collect();
            let removed: ValueSet = before.difference(&data).cloned().collect();
            let delta = (!added.is_empty() || !removed.is_empty())
                .then_some(Delta::Members { added, removed });
            (result, before, delta)
        };
        let deltas: Vec<Delta> = delta.into_iter().collect();
        self.0.commit(&Eventful::Set(self.clone()), before, &deltas)?;
        Ok(result)
    }

    /// Adds a member.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn add(&self, value: impl Into<Value>) -> Result<(), TraitError> {
        let value = value.into();
        self.mutate(|data| {
            data.insert(value);
        })
    }

    /// Removes a member if present.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn discard(&self, value: &Value) -> Result<(), TraitError> {
        self.mutate(|data| {
            data.shift_remove(value);
        })
    }

    /// Removes a member that must be present.
    ///
    /// # Errors
    ///
    /// Fails when `value` is not a member, or when an observer or the owning
    /// trait rejects the change.
    pub fn remove(&self, value: &Value) -> Result<(), TraitError> {
        if !self.contains(value) {
            return Err(TraitError::Missing(value.to_string()));
        }
        self.discard(value)
    }

    /// Removes and returns the most recently inserted member.
    ///
    /// # Errors
    ///
    /// Fails when the set is empty, or when an observer or the owning trait
    /// rejects the change.
    pub fn pop(&self) -> Result<Value, TraitError> {
        self.mutate(ValueSet::pop)?
            .ok_or_else(|| TraitError::custom("pop from an empty set"))
    }

    /// Removes every member.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn clear(&self) -> Result<(), TraitError> {
        self.mutate(ValueSet::clear)
    }

    /// Adds every value.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn update<T: Into<Value>>(
        &self,
        values: impl IntoIterator<Item = T>,
    ) -> Result<(), TraitError> {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.mutate(|data| data.extend(values))
    }

    /// Removes every value that is a member.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn difference_update<T: Into<Value>>(
        &self,
        values: impl IntoIterator<Item = T>,
    ) -> Result<(), TraitError> {
        let values: ValueSet = values.into_iter().map(Into::into).collect();
        self.mutate(|data| data.retain(|v| !values.contains(v)))
    }

    /// Keeps only members that are also in `values`.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn intersection_update<T: Into<Value>>(
        &self,
        values: impl IntoIterator<Item = T>,
    ) -> Result<(), TraitError> {
        let values: ValueSet = values.into_iter().map(Into::into).collect();
        self.mutate(|data| data.retain(|v| values.contains(v)))
    }

    /// Keeps members in exactly one of the set and `values`.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn symmetric_difference_update<T: Into<Value>>(
        &self,
        values: impl IntoIterator<Item = T>,
    ) -> Result<(), TraitError> {
        let values: ValueSet = values.into_iter().map(Into::into).collect();
        self.mutate(|data| {
            for value in values {
                if !data.shift_remove(&value) {
                    data.insert(value);
                }
            }
        })
    }

    /// Replaces the contents wholesale, as one delta.
    pub(crate) fn assign(&self, members: ValueSet) -> Result<(), TraitError> {
        self.mutate(|data| *data = members)
    }
}
