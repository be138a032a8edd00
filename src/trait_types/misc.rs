//! Any, Union, Callable, TCP address and regex traits.

use std::rc::Rc;

use regex::Regex;

use crate::describe::join_alternatives;
use crate::has_traits::HasTraits;
use crate::value::Value;

use super::{TraitBuilder, TraitError, TraitKind, TraitType};

/// Accepts any value. Defaults to `None`.
#[derive(Debug, Clone, Default)]
pub struct Any;

impl Any {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TraitKind for Any {
    fn type_name(&self) -> &'static str {
        "Any"
    }

    fn info(&self) -> String {
        "any value".to_owned()
    }

    fn validate(
        &self,
        _trait_type: &Rc<TraitType>,
        _obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        Ok(value)
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::None)
    }
}

/// Accepts a value any member trait accepts, trying members in order.
#[derive(Debug)]
pub struct Union {
    members: Vec<Rc<TraitType>>,
}

impl Union {
    pub fn new<T: TraitBuilder>(members: impl IntoIterator<Item = T>) -> Self {
        Self {
            members: members
                .into_iter()
                .map(|m| Rc::new(m.into_trait()))
                .collect(),
        }
    }
}

impl TraitKind for Union {
    fn type_name(&self) -> &'static str {
        "Union"
    }

    fn info(&self) -> String {
        let infos: Vec<String> = self.members.iter().map(|m| m.info()).collect();
        join_alternatives(&infos)
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        obj.cross_validation_lock(|| {
            self.members
                .iter()
                .find_map(|member| member.validate(obj, value.clone()).ok())
                .ok_or_else(|| trait_type.error(obj, &value))
        })
    }

    fn default_value(&self) -> Option<Value> {
        self.members
            .first()
            .map(|m| m.static_default())
            .filter(|v| !v.is_undefined())
    }

    fn nested(&self) -> Vec<Rc<TraitType>> {
        self.members.clone()
    }

    fn nests_elements(&self) -> bool {
        false
    }
}

/// A callable value: a function or a class.
#[derive(Debug, Clone, Default)]
pub struct Callable;

impl Callable {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TraitKind for Callable {
    fn type_name(&self) -> &'static str {
        "Callable"
    }

    fn info(&self) -> String {
        "a callable".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        match value {
            Value::Callable(_) | Value::Class(_) => Ok(value),
            other => Err(trait_type.error(obj, &other)),
        }
    }
}

/// A `(host, port)` tuple with the port in `0..=65535`. Lists are cast.
#[derive(Debug, Clone, Default)]
pub struct TcpAddress;

impl TcpAddress {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TraitKind for TcpAddress {
    fn type_name(&self) -> &'static str {
        "TCPAddress"
    }

    fn info(&self) -> String {
        "an (ip, port) tuple".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        if let Value::Tuple(items) | Value::List(items) = &value {
            if let [Value::Str(host), Value::Int(port)] = items.as_slice() {
                if u16::try_from(*port).is_ok() {
                    return Ok(Value::tuple([Value::str(host.as_str()), Value::Int(*port)]));
                }
            }
        }
        Err(trait_type.error(obj, &value))
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::tuple([Value::str("127.0.0.1"), Value::Int(0)]))
    }
}

/// A compiled regular expression. Strings are compiled.
#[derive(Debug, Clone, Default)]
pub struct CRegExp;

impl CRegExp {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TraitKind for CRegExp {
    fn type_name(&self) -> &'static str {
        "CRegExp"
    }

    fn info(&self) -> String {
        "a regular expression".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        match &value {
            Value::Regex(_) => Ok(value),
            Value::Str(pattern) => Regex::new(pattern)
                .map(Value::Regex)
                .map_err(|_| trait_type.error(obj, &value)),
            _ => Err(trait_type.error(obj, &value)),
        }
    }
}
