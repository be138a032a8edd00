//! Dynamically typed values.
//!
//! Every trait stores a [`Value`], config trees hold `Value` leaves, and the
//! command-line literal grammar produces them. The representation mirrors the
//! small set of builtin kinds the trait types understand, plus handles to
//! objects, classes and eventful containers.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use thiserror::Error;

use crate::eventful::Eventful;
use crate::has_traits::{Class, HasTraits};
use crate::sentinel::{Sentinel, UNDEFINED};
use crate::trait_types::TraitError;

/// Insertion-ordered mapping used for `dict` values.
pub type ValueMap = IndexMap<Value, Value>;

/// Insertion-ordered set used for `set` values.
pub type ValueSet = IndexSet<Value>;

type CallableFn = dyn Fn(&[Value]) -> Result<Value, TraitError>;

/// A named function value.
///
/// Equality is identity: two callables are equal only when they share the
/// same underlying closure.
#[derive(Clone)]
pub struct Callable {
    name: Rc<str>,
    func: Rc<CallableFn>,
}

impl Callable {
    /// Wraps a closure under a display name.
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, TraitError> + 'static,
    ) -> Self {
        Self {
            name: Rc::from(name.into()),
            func: Rc::new(func),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the callable.
    ///
    /// # Errors
    ///
    /// Returns whatever error the wrapped closure returns.
    pub fn call(&self, args: &[Value]) -> Result<Value, TraitError> {
        (self.func)(args)
    }

    fn addr(&self) -> usize {
        Rc::as_ptr(&self.func).cast::<()>() as usize
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callable").field(&self.name).finish()
    }
}

/// The coarse kind of a [`Value`], used for cast tables and type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    None,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    List,
    Tuple,
    Set,
    Dict,
    Object,
    Class,
    Regex,
    Callable,
    Sentinel,
}

impl ValueKind {
    /// Returns the builtin type name used in messages.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Set => "set",
            Self::Dict => "dict",
            Self::Object => "object",
            Self::Class => "type",
            Self::Regex => "Pattern",
            Self::Callable => "function",
            Self::Sentinel => "Sentinel",
        }
    }

    const fn rank(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Bool | Self::Int | Self::Float => 1,
            Self::Str => 2,
            Self::Bytes => 3,
            Self::List => 4,
            Self::Tuple => 5,
            Self::Set => 6,
            Self::Dict => 7,
            Self::Object => 8,
            Self::Class => 9,
            Self::Regex => 10,
            Self::Callable => 11,
            Self::Sentinel => 12,
        }
    }
}

/// A dynamically typed value.
///
/// Equality and hashing are structural for plain data and by identity for
/// objects, classes, callables and sentinels. Floats compare bitwise, so
/// `NaN == NaN` and `Int(1) != Float(1.0)`. An eventful container compares
/// equal to the plain container holding the same items.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(ValueSet),
    Dict(ValueMap),
    Object(HasTraits),
    Class(Class),
    Regex(Regex),
    Callable(Callable),
    Eventful(Eventful),
    Sentinel(&'static Sentinel),
}

impl Value {
    /// The "no value provided" marker.
    #[must_use]
    pub const fn undefined() -> Self {
        Self::Sentinel(&UNDEFINED)
    }

    /// Builds a string value.
    #[must_use]
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// Builds a bytes value.
    #[must_use]
    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(b.into())
    }

    /// Builds a list from anything convertible to values.
    pub fn list<T: Into<Self>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a tuple from anything convertible to values.
    pub fn tuple<T: Into<Self>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Builds a set, dropping duplicates while keeping first-seen order.
    pub fn set<T: Into<Self>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Builds a dict from key/value pairs.
    pub fn dict<K: Into<Self>, V: Into<Self>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::Dict(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the kind of this value. Eventful containers report the kind
    /// of the container they wrap.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::None => ValueKind::None,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::List(_) => ValueKind::List,
            Self::Tuple(_) => ValueKind::Tuple,
            Self::Set(_) => ValueKind::Set,
            Self::Dict(_) => ValueKind::Dict,
            Self::Object(_) => ValueKind::Object,
            Self::Class(_) => ValueKind::Class,
            Self::Regex(_) => ValueKind::Regex,
            Self::Callable(_) => ValueKind::Callable,
            Self::Eventful(e) => e.kind(),
            Self::Sentinel(_) => ValueKind::Sentinel,
        }
    }

    /// Returns the type name used in messages; objects report their class.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Object(obj) => obj.class().name().to_owned(),
            other => other.kind().type_name().to_owned(),
        }
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// True for the [`UNDEFINED`] sentinel.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Sentinel(s) if std::ptr::eq(*s, &UNDEFINED))
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_dict(&self) -> Option<&ValueMap> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&HasTraits> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_class(&self) -> Option<&Class> {
        match self {
            Self::Class(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_eventful(&self) -> Option<&Eventful> {
        match self {
            Self::Eventful(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the items of a list, tuple or set (eventful or not), in order.
    #[must_use]
    pub fn to_items(&self) -> Option<Vec<Self>> {
        match self {
            Self::List(items) | Self::Tuple(items) => Some(items.clone()),
            Self::Set(items) => Some(items.iter().cloned().collect()),
            Self::Eventful(e) => e.snapshot().to_items(),
            _ => None,
        }
    }

    /// False for `None`, `False`, zero and empty strings or containers.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(x) => *x != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Bytes(b) => !b.is_empty(),
            Self::List(items) | Self::Tuple(items) => !items.is_empty(),
            Self::Set(items) => !items.is_empty(),
            Self::Dict(map) => !map.is_empty(),
            Self::Eventful(e) => e.len() > 0,
            Self::Object(_)
            | Self::Class(_)
            | Self::Regex(_)
            | Self::Callable(_)
            | Self::Sentinel(_) => true,
        }
    }

    /// Copies containers recursively. Eventful containers come back as fresh
    /// wrappers with no hooks attached; objects and classes stay shared.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::List(items) => Self::List(items.iter().map(Self::deep_copy).collect()),
            Self::Tuple(items) => Self::Tuple(items.iter().map(Self::deep_copy).collect()),
            Self::Set(items) => Self::Set(items.iter().map(Self::deep_copy).collect()),
            Self::Dict(map) => Self::Dict(
                map.iter()
                    .map(|(k, v)| (k.deep_copy(), v.deep_copy()))
                    .collect(),
            ),
            Self::Eventful(e) => Self::Eventful(e.deep_copy()),
            other => other.clone(),
        }
    }

    /// Replaces every eventful wrapper, at any depth, with the plain
    /// container it holds.
    #[must_use]
    pub fn to_plain(&self) -> Self {
        match self {
            Self::Eventful(e) => e.snapshot().to_plain(),
            Self::List(items) => Self::List(items.iter().map(Self::to_plain).collect()),
            Self::Tuple(items) => Self::Tuple(items.iter().map(Self::to_plain).collect()),
            Self::Set(items) => Self::Set(items.iter().map(Self::to_plain).collect()),
            Self::Dict(map) => Self::Dict(
                map.iter()
                    .map(|(k, v)| (k.to_plain(), v.to_plain()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// A total order used for sorting: numbers numerically, strings and bytes
    /// lexicographically, sequences item by item, anything else by kind.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a
                .iter()
                .zip(b)
                .map(|(x, y)| x.total_cmp(y))
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.kind().rank().cmp(&other.kind().rank()),
            },
        }
    }

    #[allow(clippy::cast_precision_loss)]
    const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Converts into JSON. Tuples and sets become arrays.
    ///
    /// # Errors
    ///
    /// Returns [`NotJsonSerializable`] for objects, classes, callables,
    /// regexes, bytes, sentinels, non-finite floats, and dict keys that are
    /// neither strings nor integers.
    pub fn to_json(&self) -> Result<serde_json::Value, NotJsonSerializable> {
        use serde_json::Value as J;

        let unsupported = || NotJsonSerializable {
            value: self.to_string(),
        };
        Ok(match self {
            Self::None => J::Null,
            Self::Bool(b) => J::Bool(*b),
            Self::Int(i) => J::from(*i),
            Self::Float(x) => serde_json::Number::from_f64(*x)
                .map(J::Number)
                .ok_or_else(unsupported)?,
            Self::Str(s) => J::String(s.clone()),
            Self::List(items) | Self::Tuple(items) => {
                J::Array(items.iter().map(Self::to_json).collect::<Result<_, _>>()?)
            }
            Self::Set(items) => J::Array(items.iter().map(Self::to_json).collect::<Result<_, _>>()?),
            Self::Dict(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    let key = match k {
                        Self::Str(s) => s.clone(),
                        Self::Int(i) => i.to_string(),
                        _ => return Err(unsupported()),
                    };
                    out.insert(key, v.to_json()?);
                }
                J::Object(out)
            }
            Self::Eventful(e) => e.snapshot().to_json()?,
            Self::Bytes(_)
            | Self::Object(_)
            | Self::Class(_)
            | Self::Regex(_)
            | Self::Callable(_)
            | Self::Sentinel(_) => return Err(unsupported()),
        })
    }

    /// Converts from JSON. Integral numbers that fit `i64` become `Int`,
    /// other numbers `Float`, arrays `List`, objects `Dict` with string keys.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        use serde_json::Value as J;

        match json {
            J::Null => Self::None,
            J::Bool(b) => Self::Bool(*b),
            J::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            J::String(s) => Self::Str(s.clone()),
            J::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            J::Object(map) => Self::Dict(
                map.iter()
                    .map(|(k, v)| (Self::Str(k.clone()), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Returned when a value has no JSON representation.
#[derive(Debug, Error)]
#[error("{value} is not JSON serializable")]
pub struct NotJsonSerializable {
    /// Rendering of the offending value
    pub value: String,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Class(a), Self::Class(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            (Self::Callable(a), Self::Callable(b)) => a == b,
            (Self::Sentinel(a), Self::Sentinel(b)) => std::ptr::eq(*a, *b),
            (Self::Eventful(a), Self::Eventful(b)) => a.ptr_eq(b) || a.snapshot() == b.snapshot(),
            (Self::Eventful(a), plain) | (plain, Self::Eventful(a)) => a.snapshot() == *plain,
            _ => false,
        }
    }
}

impl Eq for Value {}

fn unordered_hash<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    items.fold(0u64, |acc, item| {
        let mut hasher = DefaultHasher::new();
        item.hash(&mut hasher);
        acc.wrapping_add(hasher.finish())
    })
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Self::Eventful(e) = self {
            e.snapshot().hash(state);
            return;
        }
        std::mem::discriminant(self).hash(state);
        match self {
            Self::None => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(x) => x.to_bits().hash(state),
            Self::Str(s) => s.hash(state),
            Self::Bytes(b) => b.hash(state),
            Self::List(items) | Self::Tuple(items) => items.hash(state),
            Self::Set(items) => {
                items.len().hash(state);
                unordered_hash(items.iter()).hash(state);
            }
            Self::Dict(map) => {
                map.len().hash(state);
                unordered_hash(map.iter()).hash(state);
            }
            Self::Object(obj) => obj.addr().hash(state),
            Self::Class(class) => class.addr().hash(state),
            Self::Regex(re) => re.as_str().hash(state),
            Self::Callable(c) => c.addr().hash(state),
            Self::Sentinel(s) => std::ptr::hash(*s, state),
            Self::Eventful(_) => {}
        }
    }
}

fn write_str_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    write!(f, "{quote}")?;
    for ch in s.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c if c.is_control() => write!(f, "\\x{:02x}", u32::from(c))?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

fn write_bytes_literal(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("b'")?;
    for &b in bytes {
        match b {
            b'\\' => f.write_str("\\\\")?,
            b'\'' => f.write_str("\\'")?,
            b'\n' => f.write_str("\\n")?,
            b'\r' => f.write_str("\\r")?,
            b'\t' => f.write_str("\\t")?,
            0x20..=0x7e => write!(f, "{}", char::from(b))?,
            _ => write!(f, "\\x{b:02x}")?,
        }
    }
    f.write_str("'")
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        write!(f, "{x:.1}")
    } else {
        write!(f, "{x}")
    }
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write_float(f, *x),
            Self::Str(s) => write_str_literal(f, s),
            Self::Bytes(b) => write_bytes_literal(f, b),
            Self::List(items) => {
                f.write_str("[")?;
                write_joined(f, items.iter())?;
                f.write_str("]")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items.iter())?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Self::Set(items) if items.is_empty() => f.write_str("set()"),
            Self::Set(items) => {
                f.write_str("{")?;
                write_joined(f, items.iter())?;
                f.write_str("}")
            }
            Self::Dict(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Object(obj) => write!(f, "<{} object>", obj.class().name()),
            Self::Class(class) => write!(f, "<class '{}'>", class.name()),
            Self::Regex(re) => {
                f.write_str("re.compile(")?;
                write_str_literal(f, re.as_str())?;
                f.write_str(")")
            }
            Self::Callable(c) => write!(f, "<function {}>", c.name()),
            Self::Eventful(e) => write!(f, "{}", e.snapshot()),
            Self::Sentinel(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Self::Dict(map)
    }
}

impl From<ValueSet> for Value {
    fn from(set: ValueSet) -> Self {
        Self::Set(set)
    }
}

impl From<HasTraits> for Value {
    fn from(obj: HasTraits) -> Self {
        Self::Object(obj)
    }
}

impl From<Class> for Value {
    fn from(class: Class) -> Self {
        Self::Class(class)
    }
}

impl From<Eventful> for Value {
    fn from(e: Eventful) -> Self {
        Self::Eventful(e)
    }
}

impl From<Regex> for Value {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Self::Callable(c)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
