//! Deferred container edits recorded against a config key.

use std::cell::OnceCell;
use std::fmt;

use crate::value::{Value, ValueMap, ValueSet};

use super::error::ConfigError;
use super::tree::{Config, ConfigItem};

/// Pending `update` contents. The first update picks the kind.
#[derive(Debug, Clone, PartialEq)]
enum Update {
    Dict(ValueMap),
    Set(ValueSet),
}

/// Container edits recorded before the value they apply to is known.
///
/// Lets a config say "append to whatever the list is" instead of
/// replacing it. The edits are replayed by [`LazyValue::get_value`]
/// against the current value; the result is cached.
#[derive(Debug, Clone, Default)]
pub struct LazyValue {
    extend: Vec<Value>,
    prepend: Vec<Value>,
    inserts: Vec<(i64, Value)>,
    update: Option<Update>,
    resolved: OnceCell<Value>,
}

impl LazyValue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, value: impl Into<Value>) {
        self.extend.push(value.into());
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = Value>) {
        self.extend.extend(values);
    }

    /// Adds items at the front. Later calls end up in front of earlier ones.
    pub fn prepend(&mut self, values: impl IntoIterator<Item = Value>) {
        let mut front: Vec<Value> = values.into_iter().collect();
        front.append(&mut self.prepend);
        self.prepend = front;
    }

    /// Inserts `value` at `index` with list-insert semantics.
    pub fn insert(&mut self, index: i64, value: impl Into<Value>) {
        self.inserts.push((index, value.into()));
    }

    /// Records a dict or set update.
    ///
    /// # Errors
    ///
    /// Fails when `other` is not a dict, set, list or tuple, or when a
    /// dict update is recorded against pending set edits.
    pub fn update(&mut self, other: &Value) -> Result<(), ConfigError> {
        let other = other.to_plain();
        let update = self.update.get_or_insert_with(|| match &other {
            Value::Dict(_) => Update::Dict(ValueMap::new()),
            _ => Update::Set(ValueSet::new()),
        });
        match (update, &other) {
            (Update::Dict(pending), Value::Dict(map)) => {
                pending.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            (Update::Set(pending), Value::Dict(map)) => pending.extend(map.keys().cloned()),
            (Update::Set(pending), _) => {
                let items = other.to_items().ok_or_else(|| {
                    ConfigError::Invalid(format!("cannot update a set with {}", other.type_name()))
                })?;
                pending.extend(items);
            }
            (Update::Dict(_), _) => {
                return Err(ConfigError::Invalid(format!(
                    "cannot update a dict with {}",
                    other.type_name()
                )));
            }
        }
        Ok(())
    }

    /// Records adding one member to a set.
    ///
    /// # Errors
    ///
    /// Fails when a dict update is already pending.
    pub fn add(&mut self, value: impl Into<Value>) -> Result<(), ConfigError> {
        self.update(&Value::Set(std::iter::once(value.into()).collect()))
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extend.is_empty()
            && self.prepend.is_empty()
            && self.inserts.is_empty()
            && self.update.is_none()
    }

    /// Folds these edits into `other`, an item of a config being merged in.
    ///
    /// Against another lazy value the edits combine, with `other` as the
    /// base. Against a concrete value the edits are applied to it. A
    /// section replaces the edits outright.
    #[must_use]
    pub fn merge_into(&self, other: &ConfigItem) -> ConfigItem {
        match other {
            ConfigItem::Lazy(theirs) => {
                let mut update = theirs.update.clone();
                match (&mut update, &self.update) {
                    (Some(Update::Dict(base)), Some(Update::Dict(mine))) => {
                        base.extend(mine.iter().map(|(k, v)| (k.clone(), v.clone())));
                    }
                    (Some(Update::Set(base)), Some(Update::Set(mine))) => {
                        base.extend(mine.iter().cloned());
                    }
                    (None, Some(mine)) => update = Some(mine.clone()),
                    _ => {}
                }
                ConfigItem::Lazy(Self {
                    extend: theirs.extend.iter().chain(&self.extend).cloned().collect(),
                    prepend: self.prepend.iter().chain(&theirs.prepend).cloned().collect(),
                    inserts: theirs.inserts.iter().chain(&self.inserts).cloned().collect(),
                    update,
                    resolved: OnceCell::new(),
                })
            }
            ConfigItem::Value(value) => ConfigItem::Value(self.get_value(value)),
            ConfigItem::Section(section) => ConfigItem::Section(section.clone()),
        }
    }

    /// Applies the recorded edits to a copy of `initial`.
    ///
    /// The first result is cached and returned on later calls.
    #[must_use]
    pub fn get_value(&self, initial: &Value) -> Value {
        self.resolved
            .get_or_init(|| self.apply(initial.to_plain()))
            .clone()
    }

    /// Applies the recorded edits to a copy of `initial`, bypassing the
    /// cache.
    #[must_use]
    pub fn resolve(&self, initial: &Value) -> Value {
        self.apply(initial.to_plain())
    }

    fn apply(&self, mut value: Value) -> Value {
        match &mut value {
            Value::List(items) => {
                for (index, item) in &self.inserts {
                    let at = resolve_index(*index, items.len());
                    items.insert(at, item.clone());
                }
                items.splice(0..0, self.prepend.iter().cloned());
                items.extend(self.extend.iter().cloned());
            }
            Value::Dict(map) => {
                if let Some(Update::Dict(pending)) = &self.update {
                    map.extend(pending.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
            Value::Set(set) => match &self.update {
                Some(Update::Set(pending)) => set.extend(pending.iter().cloned()),
                Some(Update::Dict(pending)) => set.extend(pending.keys().cloned()),
                None => {}
            },
            _ => {}
        }
        value
    }

    /// A description of the recorded edits, for display and JSON output.
    #[must_use]
    pub fn to_dict(&self) -> Value {
        let mut out = ValueMap::new();
        match &self.update {
            Some(Update::Dict(map)) => {
                out.insert(Value::str("update"), Value::Dict(map.clone()));
            }
            Some(Update::Set(set)) => {
                out.insert(Value::str("update"), Value::Set(set.clone()));
            }
            None => {}
        }
        if !self.extend.is_empty() {
            out.insert(Value::str("extend"), Value::List(self.extend.clone()));
        }
        if !self.prepend.is_empty() {
            out.insert(Value::str("prepend"), Value::List(self.prepend.clone()));
        }
        if !self.inserts.is_empty() {
            let inserts = self
                .inserts
                .iter()
                .map(|(i, v)| Value::Tuple(vec![Value::Int(*i), v.clone()]))
                .collect();
            out.insert(Value::str("inserts"), Value::List(inserts));
        }
        Value::Dict(out)
    }
}

/// Where `list.insert(index, ..)` puts an item in a list of length `len`.
fn resolve_index(index: i64, len: usize) -> usize {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let at = if index < 0 { (len_i + index).max(0) } else { index.min(len_i) };
    usize::try_from(at).unwrap_or(len)
}

/// Compares recorded edits; the cached result is ignored.
impl PartialEq for LazyValue {
    fn eq(&self, other: &Self) -> bool {
        self.extend == other.extend
            && self.prepend == other.prepend
            && self.inserts == other.inserts
            && self.update == other.update
    }
}

impl fmt::Display for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved.get() {
            Some(value) => write!(f, "<LazyValue value={value}>"),
            None => write!(f, "<LazyValue {}>", self.to_dict()),
        }
    }
}

impl From<LazyValue> for ConfigItem {
    fn from(lazy: LazyValue) -> Self {
        Self::Lazy(lazy)
    }
}

impl From<Config> for ConfigItem {
    fn from(section: Config) -> Self {
        Self::Section(section)
    }
}

#[cfg(test)]
#[path = "lazy_tests.rs"]
mod tests;
