//! Eventful dict.

use std::rc::Rc;

use crate::trait_types::TraitError;
use crate::value::{Value, ValueMap};

use super::{Delta, Eventful, Watched};

/// A dict that reports per-key `(key, old, new)` deltas.
#[derive(Clone)]
pub struct EventfulDict(pub(super) Rc<Watched<ValueMap>>);

impl EventfulDict {
    /// Creates a detached dict.
    pub fn new<K: Into<Value>, V: Into<Value>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(Rc::new(Watched::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
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
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.0.data.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.0.data.borrow().contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<Value> {
        self.0.data.borrow().keys().cloned().collect()
    }

    /// A plain copy of the entries.
    #[must_use]
    pub fn to_map(&self) -> ValueMap {
        self.0.data.borrow().clone()
    }

    /// Applies `op` and reports every listed key whose value changed. A
    /// rejected change is undone.
    fn mutate<R>(
        &self,
        keys: &[Value],
        op: impl FnOnce(&mut ValueMap) -> R,
    ) -> Result<R, TraitError> {
        let (result, before, deltas) = {
            let mut data = self.0.data.borrow_mut();
            let before = data.clone();
            let result = op(&mut data);
            let deltas: Vec<Delta> = keys
                .iter()
                .filter_map(|key| {
                    let old = before.get(key).cloned().unwrap_or_else(Value::undefined);
                    let new = data.get(key).cloned().unwrap_or_else(Value::undefined);
                    (old != new).then(|| Delta::Key {
                        key: key.clone(),
                        old,
                        new,
                    })
                })
                .collect();
            (result, before, deltas)
        };
        self.0.commit(&Eventful::Dict(self.clone()), before, &deltas)?;
        Ok(result)
    }

    /// Sets one entry.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn set_item(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<(), TraitError> {
        let key = key.into();
        let value = value.into();
        self.mutate(std::slice::from_ref(&key), |data| {
            data.insert(key.clone(), value);
        })
    }

    /// Removes an entry that must exist and returns its value.
    ///
    /// # Errors
    ///
    /// Fails when `key` is absent, or when an observer or the owning trait
    /// rejects the change.
    pub fn del_item(&self, key: &Value) -> Result<Value, TraitError> {
        self.pop(key)?
            .ok_or_else(|| TraitError::Missing(key.to_string()))
    }

    /// Removes an entry if present and returns its value.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn pop(&self, key: &Value) -> Result<Option<Value>, TraitError> {
        self.mutate(std::slice::from_ref(key), |data| data.shift_remove(key))
    }

    /// Returns the value for `key`, inserting `default` first if absent.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn setdefault(
        &self,
        key: impl Into<Value>,
        default: impl Into<Value>,
    ) -> Result<Value, TraitError> {
        let key = key.into();
        let default = default.into();
        self.mutate(std::slice::from_ref(&key), |data| {
            data.entry(key.clone()).or_insert(default).clone()
        })
    }

    /// Sets several entries as one batch.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn update<K: Into<Value>, V: Into<Value>>(
        &self,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<(), TraitError> {
        let pairs: Vec<(Value, Value)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let keys: Vec<Value> = pairs.iter().map(|(k, _)| k.clone()).collect();
        self.mutate(&keys, |data| data.extend(pairs))
    }

    /// Removes every entry, reporting each key.
    ///
    /// # Errors
    ///
    /// Fails when an observer or the owning trait rejects the change.
    pub fn clear(&self) -> Result<(), TraitError> {
        let keys = self.keys();
        self.mutate(&keys, ValueMap::clear)
    }
}
