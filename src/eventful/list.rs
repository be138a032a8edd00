//! Eventful list.

use std::rc::Rc;

use crate::trait_types::TraitError;
use crate::value::Value;

use super::{Delta, Eventful, Watched};

/// Per-position deltas between two states of a list, starting at `from`.
fn diff_positions(before: &[Value], after: &[Value], from: usize) -> Vec<Delta> {
    let end = before.len().max(after.len());
    (from..end)
        .filter_map(|index| {
            let old = before.get(index).cloned().unwrap_or_else(Value::undefined);
            let new = after.get(index).cloned().unwrap_or_else(Value::undefined);
            (old != new).then_some(Delta::Index { index, old, new })
        })
        .collect()
}

/// A list that reports element-level `(index, old, new)` deltas.
#[derive(Clone)]
pub struct EventfulList(pub(super) Rc<Watched<Vec<Value>>>);

impl EventfulList {
    /// Creates a detached list.
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
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.data.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.0.data.borrow().contains(value)
    }

    /// A plain copy of the items.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.data.borrow().clone()
    }

    /// Applies `op`, then reports every position from `from` onwards whose
    /// value differs. A rejected change is undone.
    fn mutate(&self, from: usize, op: impl FnOnce(&mut Vec<Value>)) -> Result<(), TraitError> {
        let (before, deltas) = {
            let mut data = self.0.data.borrow_mut();
            let before = data.clone();
            op(&mut data);
            let deltas = diff_positions(&before, &data, from);
            (before, deltas)
        };
        self.0.commit(&Eventful::List(self.clone()), before, &deltas)
    }

    fn check_index(&self, index: usize) -> Result<(), TraitError> {
        if index < self.len() {
            Ok(())
        } else {
            Err(TraitError::Missing(format!("index {index}")))
        }
    }

    /// Replaces the item at `index`.
    ///
    /// # Errors
    ///
    /// Fails when `index` is out of range, or when an observer or the
    /// owning trait rejects the change.
    pub fn set_item(&self, index: usize, value: impl Into<Value>) -> Result<(), TraitError> {
        self.check_index(index)?;
        let value = value.into();
        self.mutate(index, |data| data[index] = value)
    }

    /// Removes and returns the item at `index`; later items shift down.
    ///
    /// # Errors
    ///
    /// Same as [`EventfulList::set_item`].
    pub fn del_item(&self, index: usize) -> Result<Value, TraitError> {
        self.check_index(index)?;
        let mut removed = Value::undefined();
        self.mutate(index, |data| removed = data.remove(index))?;
        Ok(removed)
    }

    /// Inserts before `index`; an index past the end appends.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn insert(&self, index: usize, value: impl Into<Value>) -> Result<(), TraitError> {
        let index = index.min(self.len());
        let value = value.into();
        self.mutate(index, |data| data.insert(index, value))
    }

    /// Appends one item.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn append(&self, value: impl Into<Value>) -> Result<(), TraitError> {
        let from = self.len();
        let value = value.into();
        self.mutate(from, |data| data.push(value))
    }

    /// Appends several items as one batch.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn extend<T: Into<Value>>(
        &self,
        values: impl IntoIterator<Item = T>,
    ) -> Result<(), TraitError> {
        let from = self.len();
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.mutate(from, |data| data.extend(values))
    }

    /// Removes the first item equal to `value`.
    ///
    /// # Errors
    ///
    /// Fails when no item matches, or when an observer or the owning trait
    /// rejects the change.
    pub fn remove(&self, value: &Value) -> Result<(), TraitError> {
        let index = self
            .0
            .data
            .borrow()
            .iter()
            .position(|v| v == value)
            .ok_or_else(|| TraitError::Missing(value.to_string()))?;
        self.mutate(index, |data| {
            data.remove(index);
        })
    }

    /// Reverses in place.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn reverse(&self) -> Result<(), TraitError> {
        self.mutate(0, |data| data.reverse())
    }

    /// Sorts in place using [`Value::total_cmp`].
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn sort(&self, reverse: bool) -> Result<(), TraitError> {
        self.sort_by_key(Value::clone, reverse)
    }

    /// Sorts in place by a derived key. The sort is stable.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn sort_by_key(
        &self,
        key: impl Fn(&Value) -> Value,
        reverse: bool,
    ) -> Result<(), TraitError> {
        self.mutate(0, |data| {
            data.sort_by(|a, b| {
                let ord = key(a).total_cmp(&key(b));
                if reverse { ord.reverse() } else { ord }
            });
        })
    }
}
