//! Container traits: List, Set, Tuple and Dict.
//!
//! List, Set and Dict may be marked eventful. Their values are then stored
//! as [`Eventful`] wrappers, and in-place mutations are reported to the
//! owning object and re-validated element by element.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::eventful::Eventful;
use crate::has_traits::HasTraits;
use crate::value::{Value, ValueMap, ValueSet};

use super::{ContainerKind, TraitBuilder, TraitError, TraitKind, TraitType};

/// True when validation produced a different value than it was given.
/// Eventful wrappers count as different unless they are the same container.
fn replaced(old: &Value, new: &Value) -> bool {
    match (old, new) {
        (Value::Eventful(a), Value::Eventful(b)) => !a.ptr_eq(b),
        (Value::Eventful(_), _) | (_, Value::Eventful(_)) => true,
        _ => old != new,
    }
}

fn validate_items(
    element: Option<&Rc<TraitType>>,
    obj: &HasTraits,
    items: Vec<Value>,
) -> Result<Vec<Value>, TraitError> {
    match element {
        Some(element) => items
            .into_iter()
            .map(|item| element.validate(obj, item))
            .collect(),
        None => Ok(items),
    }
}

fn check_length(
    trait_type: &TraitType,
    obj: &HasTraits,
    value: &Value,
    len: usize,
    (min, max): (usize, usize),
) -> Result<(), TraitError> {
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(TraitError::Length {
            subject: trait_type.subject(obj, true),
            min,
            max,
            value: value.to_string(),
        })
    }
}

/// Hands back the original container refreshed with the validated
/// contents, or a new wrapper when the value was a plain container. The
/// trait's hook is attached either way.
fn into_eventful(
    trait_type: &Rc<TraitType>,
    obj: &HasTraits,
    original: Option<Eventful>,
    contents: Value,
) -> Result<Value, TraitError> {
    let container = match original {
        Some(container) => {
            container.overwrite(contents);
            container
        }
        None => Eventful::wrap(&contents).ok_or_else(|| trait_type.error(obj, &contents))?,
    };
    container.add_hook(obj, trait_type);
    Ok(Value::Eventful(container))
}

/// A list, optionally with an element trait and length bounds. Tuples are
/// cast to lists.
#[derive(Debug)]
pub struct List {
    element: Option<Rc<TraitType>>,
    minlen: usize,
    maxlen: usize,
    eventful: bool,
}

impl Default for List {
    fn default() -> Self {
        Self {
            element: None,
            minlen: 0,
            maxlen: usize::MAX,
            eventful: false,
        }
    }
}

impl List {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A list whose elements must satisfy `element`.
    pub fn of(element: impl TraitBuilder) -> Self {
        Self {
            element: Some(Rc::new(element.into_trait())),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn minlen(mut self, minlen: usize) -> Self {
        self.minlen = minlen;
        self
    }

    #[must_use]
    pub const fn maxlen(mut self, maxlen: usize) -> Self {
        self.maxlen = maxlen;
        self
    }

    /// Stores values as [`EventfulList`](crate::eventful::EventfulList)s.
    #[must_use]
    pub const fn eventful(mut self, eventful: bool) -> Self {
        self.eventful = eventful;
        self
    }
}

impl TraitKind for List {
    fn type_name(&self) -> &'static str {
        "List"
    }

    fn info(&self) -> String {
        "a list".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        let (items, original) = match &value {
            Value::List(items) | Value::Tuple(items) => (items.clone(), None),
            Value::Eventful(e @ Eventful::List(list)) => (list.to_vec(), Some(e.clone())),
            _ => return Err(trait_type.error(obj, &value)),
        };
        let items = validate_items(self.element.as_ref(), obj, items)?;
        let len = items.len();
        let contents = Value::List(items);
        check_length(trait_type, obj, &contents, len, (self.minlen, self.maxlen))?;
        if !self.eventful {
            return Ok(contents);
        }
        into_eventful(trait_type, obj, original, contents)
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::List(Vec::new()))
    }

    fn nested(&self) -> Vec<Rc<TraitType>> {
        self.element.iter().cloned().collect()
    }

    fn is_eventful(&self) -> bool {
        self.eventful
    }

    fn validate_mutation(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: &Value,
    ) -> Result<(), TraitError> {
        let Some(Eventful::List(list)) = value.as_eventful() else {
            return Ok(());
        };
        check_length(trait_type, obj, value, list.len(), (self.minlen, self.maxlen))?;
        let Some(element) = &self.element else {
            return Ok(());
        };
        for (index, item) in list.to_vec().into_iter().enumerate() {
            let validated = element.validate(obj, item.clone())?;
            if replaced(&item, &validated) {
                list.set_item(index, validated)?;
            }
        }
        Ok(())
    }

    fn container(&self) -> Option<ContainerKind> {
        Some(ContainerKind::List)
    }
}

/// A set, optionally with an element trait and length bounds. Lists and
/// tuples are cast to sets.
#[derive(Debug)]
pub struct Set {
    element: Option<Rc<TraitType>>,
    minlen: usize,
    maxlen: usize,
    eventful: bool,
}

impl Default for Set {
    fn default() -> Self {
        Self {
            element: None,
            minlen: 0,
            maxlen: usize::MAX,
            eventful: false,
        }
    }
}

impl Set {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A set whose members must satisfy `element`.
    pub fn of(element: impl TraitBuilder) -> Self {
        Self {
            element: Some(Rc::new(element.into_trait())),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn minlen(mut self, minlen: usize) -> Self {
        self.minlen = minlen;
        self
    }

    #[must_use]
    pub const fn maxlen(mut self, maxlen: usize) -> Self {
        self.maxlen = maxlen;
        self
    }

    /// Stores values as [`EventfulSet`](crate::eventful::EventfulSet)s.
    #[must_use]
    pub const fn eventful(mut self, eventful: bool) -> Self {
        self.eventful = eventful;
        self
    }

    fn validate_members(&self, obj: &HasTraits, items: Vec<Value>) -> Result<ValueSet, TraitError> {
        Ok(validate_items(self.element.as_ref(), obj, items)?
            .into_iter()
            .collect())
    }
}

impl TraitKind for Set {
    fn type_name(&self) -> &'static str {
        "Set"
    }

    fn info(&self) -> String {
        "a set".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        let (items, original) = match &value {
            Value::List(items) | Value::Tuple(items) => (items.clone(), None),
            Value::Set(items) => (items.iter().cloned().collect(), None),
            Value::Eventful(e @ Eventful::Set(set)) => {
                (set.to_set().into_iter().collect(), Some(e.clone()))
            }
            _ => return Err(trait_type.error(obj, &value)),
        };
        let members = self.validate_members(obj, items)?;
        let len = members.len();
        let contents = Value::Set(members);
        check_length(trait_type, obj, &contents, len, (self.minlen, self.maxlen))?;
        if !self.eventful {
            return Ok(contents);
        }
        into_eventful(trait_type, obj, original, contents)
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::Set(ValueSet::new()))
    }

    fn nested(&self) -> Vec<Rc<TraitType>> {
        self.element.iter().cloned().collect()
    }

    fn is_eventful(&self) -> bool {
        self.eventful
    }

    fn validate_mutation(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: &Value,
    ) -> Result<(), TraitError> {
        let Some(Eventful::Set(set)) = value.as_eventful() else {
            return Ok(());
        };
        check_length(trait_type, obj, value, set.len(), (self.minlen, self.maxlen))?;
        if self.element.is_none() {
            return Ok(());
        }
        let current = set.to_set();
        let members = self.validate_members(obj, current.iter().cloned().collect())?;
        let changed = members.len() != current.len()
            || current
                .iter()
                .zip(&members)
                .any(|(old, new)| replaced(old, new));
        if changed {
            set.assign(members)?;
        }
        Ok(())
    }

    fn container(&self) -> Option<ContainerKind> {
        Some(ContainerKind::Set)
    }
}

/// A tuple, optionally with one trait per position. Lists are cast to
/// tuples.
#[derive(Debug, Default)]
pub struct Tuple {
    elements: Vec<Rc<TraitType>>,
}

impl Tuple {
    /// Any tuple.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A tuple of exactly these positions.
    pub fn of<T: TraitBuilder>(elements: impl IntoIterator<Item = T>) -> Self {
        Self {
            elements: elements
                .into_iter()
                .map(|t| Rc::new(t.into_trait()))
                .collect(),
        }
    }
}

impl TraitKind for Tuple {
    fn type_name(&self) -> &'static str {
        "Tuple"
    }

    fn info(&self) -> String {
        "a tuple".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        let items = match &value {
            Value::Tuple(items) | Value::List(items) => items.clone(),
            Value::Eventful(Eventful::List(list)) => list.to_vec(),
            _ => return Err(trait_type.error(obj, &value)),
        };
        if self.elements.is_empty() {
            return Ok(Value::Tuple(items));
        }
        let n = self.elements.len();
        check_length(trait_type, obj, &value, items.len(), (n, n))?;
        self.elements
            .iter()
            .zip(items)
            .map(|(element, item)| element.validate(obj, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Tuple)
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::Tuple(Vec::new()))
    }

    fn nested(&self) -> Vec<Rc<TraitType>> {
        self.elements.clone()
    }

    fn container(&self) -> Option<ContainerKind> {
        Some(ContainerKind::Tuple)
    }
}

/// A dict, optionally with a key trait, a value trait, and per-key value
/// traits that take precedence over the value trait.
#[derive(Debug, Default)]
pub struct Dict {
    key: Option<Rc<TraitType>>,
    value: Option<Rc<TraitType>>,
    per_key: IndexMap<Value, Rc<TraitType>>,
    eventful: bool,
}

impl Dict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys must satisfy `key`.
    #[must_use]
    pub fn key_trait(mut self, key: impl TraitBuilder) -> Self {
        self.key = Some(Rc::new(key.into_trait()));
        self
    }

    /// Values must satisfy `value`, unless a per-key trait applies.
    #[must_use]
    pub fn value_trait(mut self, value: impl TraitBuilder) -> Self {
        self.value = Some(Rc::new(value.into_trait()));
        self
    }

    /// The value under `key` must satisfy `value`.
    #[must_use]
    pub fn per_key(mut self, key: impl Into<Value>, value: impl TraitBuilder) -> Self {
        self.per_key.insert(key.into(), Rc::new(value.into_trait()));
        self
    }

    /// Stores values as [`EventfulDict`](crate::eventful::EventfulDict)s.
    #[must_use]
    pub const fn eventful(mut self, eventful: bool) -> Self {
        self.eventful = eventful;
        self
    }

    fn validate_entry(
        &self,
        obj: &HasTraits,
        key: Value,
        value: Value,
    ) -> Result<(Value, Value), TraitError> {
        let key = match &self.key {
            Some(t) => t.validate(obj, key)?,
            None => key,
        };
        let value = match self.per_key.get(&key).or(self.value.as_ref()) {
            Some(t) => t.validate(obj, value)?,
            None => value,
        };
        Ok((key, value))
    }

    fn validate_entries(&self, obj: &HasTraits, map: ValueMap) -> Result<ValueMap, TraitError> {
        map.into_iter()
            .map(|(k, v)| self.validate_entry(obj, k, v))
            .collect()
    }
}

impl TraitKind for Dict {
    fn type_name(&self) -> &'static str {
        "Dict"
    }

    fn info(&self) -> String {
        "a dict".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        let (map, original) = match &value {
            Value::Dict(map) => (map.clone(), None),
            Value::Eventful(e @ Eventful::Dict(dict)) => (dict.to_map(), Some(e.clone())),
            _ => return Err(trait_type.error(obj, &value)),
        };
        let contents = Value::Dict(self.validate_entries(obj, map)?);
        if !self.eventful {
            return Ok(contents);
        }
        into_eventful(trait_type, obj, original, contents)
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::Dict(ValueMap::new()))
    }

    fn nested(&self) -> Vec<Rc<TraitType>> {
        self.key
            .iter()
            .chain(&self.value)
            .chain(self.per_key.values())
            .cloned()
            .collect()
    }

    fn is_eventful(&self) -> bool {
        self.eventful
    }

    fn validate_mutation(
        &self,
        _trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: &Value,
    ) -> Result<(), TraitError> {
        let Some(Eventful::Dict(dict)) = value.as_eventful() else {
            return Ok(());
        };
        for (key, item) in dict.to_map() {
            let (new_key, new_item) = self.validate_entry(obj, key.clone(), item.clone())?;
            if replaced(&key, &new_key) {
                dict.pop(&key)?;
                dict.set_item(new_key, new_item)?;
            } else if replaced(&item, &new_item) {
                dict.set_item(key, new_item)?;
            }
        }
        Ok(())
    }

    fn container(&self) -> Option<ContainerKind> {
        Some(ContainerKind::Dict)
    }
}
