//! String, bytes and identifier traits.

use std::rc::Rc;

use crate::has_traits::HasTraits;
use crate::value::Value;

use super::{TraitError, TraitKind, TraitType};

/// Renders a value the way `str()` would: strings unquoted, everything
/// else in literal form.
fn stringify(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A text string. ASCII bytes are decoded.
///
/// `Unicode::coerce()` (`CUnicode`) stringifies any value.
#[derive(Debug, Clone, Default)]
pub struct Unicode {
    coerce: bool,
}

impl Unicode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn coerce() -> Self {
        Self { coerce: true }
    }
}

impl TraitKind for Unicode {
    fn type_name(&self) -> &'static str {
        if self.coerce { "CUnicode" } else { "Unicode" }
    }

    fn info(&self) -> String {
        "a unicode string".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        match &value {
            Value::Str(_) => Ok(value),
            Value::Bytes(b) if b.is_ascii() => Ok(Value::Str(String::from_utf8_lossy(b).into_owned())),
            Value::Bytes(b) if self.coerce => Ok(Value::Str(String::from_utf8_lossy(b).into_owned())),
            other if self.coerce => Ok(Value::Str(stringify(other))),
            other => Err(trait_type.error(obj, other)),
        }
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::str(""))
    }
}

/// A byte string.
///
/// `Bytes::coerce()` (`CBytes`) also accepts strings (UTF-8 encoded) and
/// lists of integers in `0..=255`.
#[derive(Debug, Clone, Default)]
pub struct Bytes {
    coerce: bool,
}

impl Bytes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn coerce() -> Self {
        Self { coerce: true }
    }
}

impl TraitKind for Bytes {
    fn type_name(&self) -> &'static str {
        if self.coerce { "CBytes" } else { "Bytes" }
    }

    fn info(&self) -> String {
        "a bytes".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        match &value {
            Value::Bytes(_) => Ok(value),
            Value::Str(s) if self.coerce => Ok(Value::Bytes(s.as_bytes().to_vec())),
            Value::List(items) if self.coerce => items
                .iter()
                .map(|item| item.as_int().and_then(|i| u8::try_from(i).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(Value::Bytes)
                .ok_or_else(|| trait_type.error(obj, &value)),
            other => Err(trait_type.error(obj, other)),
        }
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::Bytes(Vec::new()))
    }
}

/// True when `s` is a valid identifier: a letter or `_` followed by
/// letters, digits or `_`.
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.clone()),
        Value::Bytes(b) if b.is_ascii() => Some(String::from_utf8_lossy(b).into_owned()),
        _ => None,
    }
}

/// A single identifier.
#[derive(Debug, Clone, Default)]
pub struct ObjectName;

impl ObjectName {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TraitKind for ObjectName {
    fn type_name(&self) -> &'static str {
        "ObjectName"
    }

    fn info(&self) -> String {
        "a valid object identifier".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        match identifier_text(&value) {
            Some(s) if is_identifier(&s) => Ok(Value::Str(s)),
            _ => Err(trait_type.error(obj, &value)),
        }
    }
}

/// A dotted path of identifiers, e.g. `pkg.module.Name`.
#[derive(Debug, Clone, Default)]
pub struct DottedObjectName;

impl DottedObjectName {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TraitKind for DottedObjectName {
    fn type_name(&self) -> &'static str {
        "DottedObjectName"
    }

    fn info(&self) -> String {
        "a valid dotted object name".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        match identifier_text(&value) {
            Some(s) if s.split('.').all(is_identifier) => Ok(Value::Str(s)),
            _ => Err(trait_type.error(obj, &value)),
        }
    }
}
