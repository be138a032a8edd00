//! Traits whose values are objects or classes.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use crate::describe::add_article;
use crate::has_traits::{Class, HasTraits};
use crate::value::{Value, ValueKind};

use super::{TraitError, TraitKind, TraitType};

type CastFn = Rc<dyn Fn(Value) -> Result<Value, TraitError>>;

/// A class given directly, or by name and resolved when the first instance
/// of the owning class is created.
enum ClassRef {
    Resolved(Class),
    Forward { name: String, resolved: OnceCell<Class> },
}

impl ClassRef {
    fn name(&self) -> &str {
        match self {
            Self::Resolved(class) => class.name(),
            Self::Forward { name, .. } => name,
        }
    }

    fn get(&self) -> Option<Class> {
        match self {
            Self::Resolved(class) => Some(class.clone()),
            Self::Forward { resolved, .. } => resolved.get().cloned(),
        }
    }

    fn resolve(&self, trait_type: &TraitType, obj: &HasTraits) -> Result<(), TraitError> {
        let Self::Forward { name, resolved } = self else {
            return Ok(());
        };
        if resolved.get().is_some() {
            return Ok(());
        }
        let class = Class::lookup(name).ok_or_else(|| TraitError::UnresolvedClass {
            name: name.clone(),
            subject: trait_type.subject(obj, false),
        })?;
        let _ = resolved.set(class);
        Ok(())
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An instance of a class or one of its subclasses.
///
/// Values whose kind is listed in `castable` are passed through the cast
/// function first; the result must still be an instance of the class.
pub struct Instance {
    target: ClassRef,
    castable: Vec<ValueKind>,
    cast: Option<CastFn>,
    default_kwargs: Option<Vec<(String, Value)>>,
}

impl Instance {
    /// Accepts instances of `class`.
    #[must_use]
    pub fn of(class: &Class) -> Self {
        Self::with_target(ClassRef::Resolved(class.clone()))
    }

    /// Accepts instances of the class registered under `name`, resolved
    /// when the owning class is first instantiated.
    pub fn forward(name: impl Into<String>) -> Self {
        Self::with_target(ClassRef::Forward {
            name: name.into(),
            resolved: OnceCell::new(),
        })
    }

    const fn with_target(target: ClassRef) -> Self {
        Self {
            target,
            castable: Vec::new(),
            cast: None,
            default_kwargs: None,
        }
    }

    /// Casts values of the given kinds with `cast` before checking them.
    #[must_use]
    pub fn castable(
        mut self,
        kinds: impl IntoIterator<Item = ValueKind>,
        cast: impl Fn(Value) -> Result<Value, TraitError> + 'static,
    ) -> Self {
        self.castable.extend(kinds);
        self.cast = Some(Rc::new(cast));
        self
    }

    /// Builds a fresh instance, with these trait values, as the default.
    #[must_use]
    pub fn default_kwargs<K: Into<String>>(
        mut self,
        kwargs: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        self.default_kwargs = Some(kwargs.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }

    fn accepts(&self, value: &Value) -> bool {
        match (value, self.target.get()) {
            (Value::Object(obj), Some(class)) => obj.class().is_subclass_of(&class),
            _ => false,
        }
    }
}

impl TraitKind for Instance {
    fn type_name(&self) -> &'static str {
        "Instance"
    }

    fn info(&self) -> String {
        add_article(self.target.name(), false, false)
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        if self.accepts(&value) {
            return Ok(value);
        }
        if let Some(cast) = &self.cast {
            if self.castable.contains(&value.kind()) {
                let casted = cast(value.clone()).map_err(|_| trait_type.error(obj, &value))?;
                if self.accepts(&casted) {
                    return Ok(casted);
                }
            }
        }
        Err(trait_type.error(obj, &value))
    }

    fn dynamic_default(&self) -> Option<Result<Value, TraitError>> {
        let kwargs = self.default_kwargs.as_ref()?;
        let class = self.target.get()?;
        Some(HasTraits::with_values(&class, kwargs.iter().cloned()).map(Value::Object))
    }

    fn instance_init(&self, trait_type: &TraitType, obj: &HasTraits) -> Result<(), TraitError> {
        self.target.resolve(trait_type, obj)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("target", &self.target)
            .field("castable", &self.castable)
            .finish_non_exhaustive()
    }
}

/// A class that is `base` or one of its subclasses. Strings are resolved
/// through the class registry.
#[derive(Debug)]
pub struct Type {
    base: ClassRef,
}

impl Type {
    #[must_use]
    pub fn subclass_of(base: &Class) -> Self {
        Self {
            base: ClassRef::Resolved(base.clone()),
        }
    }

    /// Like [`Type::subclass_of`], naming the base class for later resolution.
    pub fn forward(name: impl Into<String>) -> Self {
        Self {
            base: ClassRef::Forward {
                name: name.into(),
                resolved: OnceCell::new(),
            },
        }
    }
}

impl TraitKind for Type {
    fn type_name(&self) -> &'static str {
        "Type"
    }

    fn info(&self) -> String {
        format!("a subclass of '{}'", self.base.name())
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        let candidate = match &value {
            Value::Class(class) => Some(class.clone()),
            Value::Str(name) => Class::lookup(name),
            _ => None,
        };
        match (candidate, self.base.get()) {
            (Some(class), Some(base)) if class.is_subclass_of(&base) => Ok(Value::Class(class)),
            _ => Err(trait_type.error(obj, &value)),
        }
    }

    fn default_value(&self) -> Option<Value> {
        self.base.get().map(Value::Class)
    }

    fn instance_init(&self, trait_type: &TraitType, obj: &HasTraits) -> Result<(), TraitError> {
        self.base.resolve(trait_type, obj)
    }
}

/// An instance of the declaring class (or a subclass), or `None`.
#[derive(Debug, Clone, Default)]
pub struct This;

impl This {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TraitKind for This {
    fn type_name(&self) -> &'static str {
        "This"
    }

    fn info(&self) -> String {
        "an instance of the same type as the receiver or None".to_owned()
    }

    fn validate(
        &self,
        trait_type: &Rc<TraitType>,
        obj: &HasTraits,
        value: Value,
    ) -> Result<Value, TraitError> {
        let accepted = match (&value, trait_type.this_class()) {
            (Value::None, _) => true,
            (Value::Object(other), Some(class)) => other.class().is_subclass_of(&class),
            _ => false,
        };
        if accepted {
            Ok(value)
        } else {
            Err(trait_type.error(obj, &value))
        }
    }

    fn default_value(&self) -> Option<Value> {
        Some(Value::None)
    }
}
