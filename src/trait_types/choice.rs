//! Enumerated-choice traits.

use std::rc::Rc;

use crate::has_traits::HasTraits;
use crate::value::Value;

use super::{TraitError, TraitKind, TraitType};

fn choices_repr(values: &[Value]) -> String {
    Value::List(values.to_vec()).to_string()
}

/// One of a fixed set of values, matched exactly.
#[derive(Debug, Clone)]
pub struct Enum {
    values: Vec<Value>,
}

impl Enum {
    pub fn new<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl TraitKind for Enum {
    fn type_name(&self) -> &'static str {
        "Enum"
    }

    fn info(&self) -> String {
        format!("any of {}", choices_repr(&self.values))
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        if self.values.contains(&value) {
            Ok(value)
        } else {
            Err(trait_type.error(obj, &value))
        }
    }
}

/// One of a fixed set of strings, matched ignoring case. The declared
/// spelling is stored.
#[derive(Debug, Clone)]
pub struct CaselessStrEnum {
    values: Vec<String>,
}

impl CaselessStrEnum {
    pub fn new<T: Into<String>>(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl TraitKind for CaselessStrEnum {
    fn type_name(&self) -> &'static str {
        "CaselessStrEnum"
    }

    fn info(&self) -> String {
        let values: Vec<Value> = self.values.iter().map(|v| Value::str(v.as_str())).collect();
        format!("any of {} (case-insensitive)", choices_repr(&values))
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        let found = value.as_str().and_then(|s| {
            let folded = s.to_lowercase();
            self.values.iter().find(|v| v.to_lowercase() == folded)
        });
        found
            .map(|v| Value::str(v.as_str()))
            .ok_or_else(|| trait_type.error(obj, &value))
    }
}

/// One of a fixed set of strings, matched by unique prefix (or substring).
///
/// An exact match always wins. Otherwise exactly one choice must match;
/// zero or several candidates is an error.
#[derive(Debug, Clone)]
pub struct FuzzyEnum {
    values: Vec<String>,
    case_sensitive: bool,
    substring_match: bool,
}

impl FuzzyEnum {
    pub fn new<T: Into<String>>(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            case_sensitive: false,
            substring_match: false,
        }
    }

    #[must_use]
    pub const fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    /// Match anywhere in a choice instead of only at its start.
    #[must_use]
    pub const fn substring_match(mut self, yes: bool) -> Self {
        self.substring_match = yes;
        self
    }

    fn fold(&self, s: &str) -> String {
        if self.case_sensitive {
            s.to_owned()
        } else {
            s.to_lowercase()
        }
    }

    fn resolve(&self, input: &str) -> Option<&str> {
        let needle = self.fold(input);
        if let Some(exact) = self.values.iter().find(|v| self.fold(v) == needle) {
            return Some(exact);
        }
        let mut candidates = self.values.iter().filter(|v| {
            let choice = self.fold(v);
            if self.substring_match {
                choice.contains(&needle)
            } else {
                choice.starts_with(&needle)
            }
        });
        match (candidates.next(), candidates.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }
}

impl TraitKind for FuzzyEnum {
    fn type_name(&self) -> &'static str {
        "FuzzyEnum"
    }

    fn info(&self) -> String {
        let values: Vec<Value> = self.values.iter().map(|v| Value::str(v.as_str())).collect();
        let case = if self.case_sensitive {
            "case-sensitive"
        } else {
            "case-insensitive"
        };
        let how = if self.substring_match {
            "substring"
        } else {
            "prefix"
        };
        format!("any {case} {how} of {}", choices_repr(&values))
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        value
            .as_str()
            .and_then(|s| self.resolve(s))
            .map(Value::str)
            .ok_or_else(|| trait_type.error(obj, &value))
    }
}
