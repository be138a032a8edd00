//! Numeric and boolean traits.

use std::rc::Rc;

use crate::has_traits::HasTraits;
use crate::value::{Value, ValueKind};

use super::{TraitError, TraitKind, TraitType};

/// Checks an inclusive `[min, max]` range.
fn check_bounds<T: PartialOrd + ToString>(
    trait_type: &TraitType,
    obj: &HasTraits,
    value: T,
    min: Option<T>,
    max: Option<T>,
) -> Result<T, TraitError> {
    let violated = match (min, max) {
        (Some(min), _) if value < min => Some(("less than", min.to_string())),
        (_, Some(max)) if value > max => Some(("greater than", max.to_string())),
        _ => None,
    };
    match violated {
        Some((relation, bound)) => Err(TraitError::OutOfBounds {
            subject: trait_type.subject(obj, false),
            relation,
            bound,
            value: value.to_string(),
        }),
        None => Ok(value),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn truncate(x: f64) -> Option<i64> {
    let t = x.trunc();
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

/// An integer, with optional inclusive bounds.
///
/// `Int::coerce()` is the casting variant: it also accepts floats
/// (truncated), booleans and numeric strings.
#[derive(Debug, Clone, Default)]
pub struct Int {
    min: Option<i64>,
    max: Option<i64>,
    castable: Vec<ValueKind>,
    coerce: bool,
}

impl Int {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The casting variant (`CInt`).
    #[must_use]
    pub fn coerce() -> Self {
        Self {
            coerce: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub const fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    /// Also accept values of these kinds, converting them to integers.
    #[must_use]
    pub fn castable(mut self, kinds: impl IntoIterator<Item = ValueKind>) -> Self {
        self.castable.extend(kinds);
        self
    }

    fn cast(&self, value: &Value) -> Option<i64> {
        match value {
            Value::Int(i) => Some(*i),
            Value::Float(x) if self.coerce || self.castable.contains(&ValueKind::Float) => {
                truncate(*x)
            }
            Value::Bool(b) if self.coerce || self.castable.contains(&ValueKind::Bool) => {
                Some(i64::from(*b))
            }
            Value::Str(s) if self.coerce || self.castable.contains(&ValueKind::Str) => {
                s.trim().replace('_', "").parse().ok()
            }
            _ => None,
        }
    }
}

impl TraitKind for Int {
    fn type_name(&self) -> &'static str {
        if self.coerce { "CInt" } else { "Int" }
    }

    fn info(&self) -> String {
        "an int".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        let i = self
            .cast(&value)
            .ok_or_else(|| trait_type.error(obj, &value))?;
        check_bounds(trait_type, obj, i, self.min, self.max).map(Value::Int)
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::Int(0))
    }
}

/// A float, with optional inclusive bounds. Integers are always accepted
/// and converted.
///
/// `Float::coerce()` also accepts booleans and numeric strings.
#[derive(Debug, Clone, Default)]
pub struct Float {
    min: Option<f64>,
    max: Option<f64>,
    coerce: bool,
}

impl Float {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The casting variant (`CFloat`).
    #[must_use]
    pub fn coerce() -> Self {
        Self {
            coerce: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub const fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

impl TraitKind for Float {
    fn type_name(&self) -> &'static str {
        if self.coerce { "CFloat" } else { "Float" }
    }

    fn info(&self) -> String {
        "a float".to_owned()
    }

    #[allow(clippy::cast_precision_loss)]
    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        let x = match &value {
            Value::Float(x) => *x,
            Value::Int(i) => *i as f64,
            Value::Bool(b) if self.coerce => f64::from(u8::from(*b)),
            Value::Str(s) if self.coerce => s
                .trim()
                .parse()
                .map_err(|_| trait_type.error(obj, &value))?,
            _ => return Err(trait_type.error(obj, &value)),
        };
        check_bounds(trait_type, obj, x, self.min, self.max).map(Value::Float)
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::Float(0.0))
    }
}

/// A boolean. Integers `0` and `1` are accepted as `False` and `True`.
///
/// `Bool::coerce()` accepts anything and keeps its truthiness.
#[derive(Debug, Clone, Default)]
pub struct Bool {
    coerce: bool,
}

impl Bool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The casting variant (`CBool`).
    #[must_use]
    pub const fn coerce() -> Self {
        Self { coerce: true }
    }
}

impl TraitKind for Bool {
    fn type_name(&self) -> &'static str {
        if self.coerce { "CBool" } else { "Bool" }
    }

    fn info(&self) -> String {
        "a boolean".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        match value {
            Value::Bool(_) => Ok(value),
            Value::Int(0) => Ok(Value::Bool(false)),
            Value::Int(1) => Ok(Value::Bool(true)),
            other if self.coerce => Ok(Value::Bool(other.is_truthy())),
            other => Err(trait_type.error(obj, &other)),
        }
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::Bool(false))
    }
}
