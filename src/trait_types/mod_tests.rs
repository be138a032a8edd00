//! Tests for trait descriptors and the built-in kinds.

use super::*;
use crate::value::{Callable as Function, ValueKind};

/// An instance of `Foo` with a single trait `x`.
fn foo(t: impl TraitBuilder) -> HasTraits {
    let class = Class::builder("Foo").add_trait("x", t).build();
    HasTraits::new(&class).unwrap()
}

fn accepts(t: impl TraitBuilder, value: impl Into<Value>) -> Value {
    let obj = foo(t);
    obj.set("x", value).unwrap();
    obj.get("x").unwrap()
}

fn rejects(t: impl TraitBuilder, value: impl Into<Value>) -> TraitError {
    foo(t).set("x", value).unwrap_err()
}

mod numeric {
    use super::*;

    #[test]
    fn strict_int() {
        assert_eq!(accepts(Int::new(), 3), Value::Int(3));
        assert!(matches!(rejects(Int::new(), 3.5), TraitError::Validation { .. }));
        assert!(matches!(rejects(Int::new(), "3"), TraitError::Validation { .. }));
        assert!(matches!(rejects(Int::new(), true), TraitError::Validation { .. }));
    }

    #[test]
    fn validation_message() {
        assert_eq!(
            rejects(Int::new(), "x").to_string(),
            "The 'x' trait of a Foo instance expected an int, not the str 'x'."
        );
    }

    #[test]
    fn int_bounds() {
        let err = rejects(Int::new().min(1).max(10), 0);
        assert_eq!(
            err.to_string(),
            "The value of the 'x' trait of a Foo instance should not be less than 1, \
             but a value of 0 was specified"
        );
        assert!(matches!(
            rejects(Int::new().max(10), 11),
            TraitError::OutOfBounds { relation: "greater than", .. }
        ));
        assert_eq!(accepts(Int::new().min(1).max(10), 10), Value::Int(10));
    }

    #[test]
    fn coercing_int() {
        assert_eq!(accepts(Int::coerce(), 3.9), Value::Int(3));
        assert_eq!(accepts(Int::coerce(), " 1_000 "), Value::Int(1000));
        assert_eq!(accepts(Int::coerce(), true), Value::Int(1));
        assert!(rejects(Int::coerce(), "ten").to_string().contains("an int"));
        assert_eq!(Int::coerce().type_name(), "CInt");
    }

    #[test]
    fn castable_kinds() {
        let t = Int::new().castable([ValueKind::Str]);
        assert_eq!(accepts(t, "7"), Value::Int(7));
        let t = Int::new().castable([ValueKind::Str]);
        assert!(rejects(t, 7.0).to_string().contains("expected an int"));
    }

    #[test]
    fn floats() {
        assert_eq!(accepts(Float::new(), 2), Value::Float(2.0));
        assert!(rejects(Float::new(), "2.5").to_string().contains("a float"));
        assert_eq!(accepts(Float::coerce(), "2.5"), Value::Float(2.5));
        assert!(matches!(
            rejects(Float::new().min(0.0), -0.5),
            TraitError::OutOfBounds { .. }
        ));
    }

    #[test]
    fn bools() {
        assert_eq!(accepts(Bool::new(), 1), Value::Bool(true));
        assert_eq!(accepts(Bool::new(), 0), Value::Bool(false));
        assert!(rejects(Bool::new(), 2).to_string().contains("a boolean"));
        assert_eq!(accepts(Bool::coerce(), "yes"), Value::Bool(true));
        assert_eq!(accepts(Bool::coerce(), Value::list::<i32>([])), Value::Bool(false));
    }

    #[test]
    fn kind_defaults() {
        let class = Class::builder("Defaults")
            .add_trait("i", Int::new())
            .add_trait("f", Float::new())
            .add_trait("b", Bool::new())
            .build();
        let obj = HasTraits::new(&class).unwrap();
        assert_eq!(obj.get("i").unwrap(), Value::Int(0));
        assert_eq!(obj.get("f").unwrap(), Value::Float(0.0));
        assert_eq!(obj.get("b").unwrap(), Value::Bool(false));
    }
}

mod text {
    use super::*;

    #[test]
    fn unicode() {
        assert_eq!(accepts(Unicode::new(), "hi"), Value::str("hi"));
        assert_eq!(accepts(Unicode::new(), Value::Bytes(b"abc".to_vec())), Value::str("abc"));
        assert!(rejects(Unicode::new(), Value::Bytes(vec![0xff])).to_string().contains("a unicode string"));
        assert!(rejects(Unicode::new(), 5).to_string().contains("the int 5"));
        assert_eq!(accepts(Unicode::coerce(), 5), Value::str("5"));
        assert_eq!(accepts(Unicode::coerce(), Value::list([1])), Value::str("[1]"));
    }

    #[test]
    fn bytes() {
        assert_eq!(accepts(Bytes::new(), Value::Bytes(vec![1])), Value::Bytes(vec![1]));
        assert!(rejects(Bytes::new(), "a").to_string().contains("a bytes"));
        assert_eq!(accepts(Bytes::coerce(), "ab"), Value::Bytes(b"ab".to_vec()));
        assert_eq!(accepts(Bytes::coerce(), Value::list([104, 105])), Value::Bytes(b"hi".to_vec()));
        assert!(matches!(
            rejects(Bytes::coerce(), Value::list([256])),
            TraitError::Validation { .. }
        ));
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("_private1"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier(""));
        assert_eq!(accepts(ObjectName::new(), "name"), Value::str("name"));
        assert!(rejects(ObjectName::new(), "a.b").to_string().contains("object identifier"));
        assert_eq!(accepts(DottedObjectName::new(), "pkg.mod.Name"), Value::str("pkg.mod.Name"));
        assert!(matches!(
            rejects(DottedObjectName::new(), "pkg..Name"),
            TraitError::Validation { .. }
        ));
    }
}

mod choices {
    use super::*;

    #[test]
    fn enum_matches_exactly() {
        let t = || Enum::new([Value::str("a"), Value::Int(1)]);
        assert_eq!(accepts(t(), 1), Value::Int(1));
        assert_eq!(
            rejects(t(), "A").to_string(),
            "The 'x' trait of a Foo instance expected any of ['a', 1], not the str 'A'."
        );
    }

    #[test]
    fn caseless_keeps_declared_spelling() {
        let t = || CaselessStrEnum::new(["Debug", "Info"]);
        assert_eq!(accepts(t(), "debug"), Value::str("Debug"));
        assert_eq!(accepts(t(), "INFO"), Value::str("Info"));
        assert!(rejects(t(), "warn").to_string().contains("(case-insensitive)"));
        assert!(matches!(rejects(t(), 1), TraitError::Validation { .. }));
    }

    #[test]
    fn fuzzy_prefixes() {
        let t = || FuzzyEnum::new(["Choice1", "choice2", "other"]);
        assert_eq!(accepts(t(), "oth"), Value::str("other"));
        assert_eq!(accepts(t(), "CHOICE2"), Value::str("choice2"));
        assert!(matches!(rejects(t(), "cho"), TraitError::Validation { .. }));
        assert!(matches!(rejects(t(), "x"), TraitError::Validation { .. }));
    }

    #[test]
    fn fuzzy_options() {
        let sensitive = || FuzzyEnum::new(["Alpha", "alpine"]).case_sensitive(true);
        assert_eq!(accepts(sensitive(), "Al"), Value::str("Alpha"));
        assert_eq!(accepts(sensitive(), "al"), Value::str("alpine"));
        let substring = FuzzyEnum::new(["foobar", "bazqux"]).substring_match(true);
        assert_eq!(accepts(substring, "qu"), Value::str("bazqux"));
        let info = FuzzyEnum::new(["a"]).substring_match(true).info();
        assert_eq!(info, "any case-insensitive substring of ['a']");
    }
}

mod containers {
    use super::*;

    #[test]
    fn list_casts_tuples_and_checks_elements() {
        assert_eq!(accepts(List::new(), Value::tuple([1, 2])), Value::list([1, 2]));
        assert_eq!(
            rejects(List::of(Int::new()), Value::list([Value::Int(1), Value::str("a")])).to_string(),
            "An element of the 'x' trait of a Foo instance expected an int, not the str 'a'."
        );
        assert!(matches!(rejects(List::new(), 1), TraitError::Validation { .. }));
    }

    #[test]
    fn list_length() {
        let err = rejects(List::new().minlen(1).maxlen(2), Value::list([1, 2, 3]));
        assert_eq!(
            err.to_string(),
            "The 'x' trait of a Foo instance must be of length 1 <= L <= 2, \
             but a value of [1, 2, 3] was specified."
        );
        assert!(matches!(
            rejects(List::new().minlen(1), Value::list::<i32>([])),
            TraitError::Length { .. }
        ));
    }

    #[test]
    fn element_coercion() {
        assert_eq!(
            accepts(List::of(Int::coerce()), Value::list(["1", "2"])),
            Value::list([1, 2])
        );
    }

    #[test]
    fn sets() {
        assert_eq!(accepts(Set::new(), Value::list([1, 1, 2])), Value::set([1, 2]));
        assert!(matches!(
            rejects(Set::of(Int::new()).maxlen(1), Value::list([1, 2])),
            TraitError::Length { .. }
        ));
        assert_eq!(accepts(Set::of(Int::coerce()), Value::list(["1", "01"])), Value::set([1]));
    }

    #[test]
    fn tuples() {
        assert_eq!(accepts(Tuple::new(), Value::list([1, 2])), Value::tuple([1, 2]));
        let t = || Tuple::of([Int::new().into_trait(), Unicode::new().into_trait()]);
        assert_eq!(
            accepts(t(), Value::list([Value::Int(1), Value::str("a")])),
            Value::tuple([Value::Int(1), Value::str("a")])
        );
        assert!(matches!(rejects(t(), Value::tuple([1])), TraitError::Length { .. }));
        assert!(matches!(
            rejects(t(), Value::tuple([1, 2])),
            TraitError::Validation { .. }
        ));
    }

    #[test]
    fn dicts() {
        let t = || {
            Dict::new()
                .key_trait(Unicode::new())
                .value_trait(Int::new())
                .per_key("name", Unicode::new())
        };
        let good = Value::dict([("a", Value::Int(1)), ("name", Value::str("n"))]);
        assert_eq!(accepts(t(), good.clone()), good);
        assert!(matches!(
            rejects(t(), Value::dict([("name", 1)])),
            TraitError::Validation { .. }
        ));
        assert!(matches!(rejects(t(), Value::dict([(1, 1)])), TraitError::Validation { .. }));
        assert!(matches!(rejects(Dict::new(), Value::list([1])), TraitError::Validation { .. }));
    }

    #[test]
    fn container_shapes() {
        assert_eq!(List::new().into_trait().container(), Some(ContainerKind::List));
        assert_eq!(Tuple::new().into_trait().container(), Some(ContainerKind::Tuple));
        assert_eq!(Dict::new().into_trait().container(), Some(ContainerKind::Dict));
        assert_eq!(Int::new().into_trait().container(), None);
        assert!(List::new().eventful(true).into_trait().is_eventful());
    }
}

mod classes {
    use super::*;

    fn shapes() -> (Class, Class, Class) {
        let shape = Class::builder("Shape").build();
        let circle = Class::builder("Circle")
            .base(&shape)
            .add_trait("r", Int::new())
            .build();
        let other = Class::builder("Other").build();
        (shape, circle, other)
    }

    #[test]
    fn instance_accepts_subclasses() {
        let (shape, circle, other) = shapes();
        let c = HasTraits::new(&circle).unwrap();
        assert!(accepts(Instance::of(&shape), c).as_object().is_some());
        let o = HasTraits::new(&other).unwrap();
        assert_eq!(
            rejects(Instance::of(&shape), o).to_string(),
            "The 'x' trait of a Foo instance expected a Shape, not the Other <Other object>."
        );
    }

    #[test]
    fn instance_without_default() {
        let (shape, ..) = shapes();
        let obj = foo(Instance::of(&shape));
        assert!(matches!(obj.get("x").unwrap_err(), TraitError::NoDefault { .. }));
        let obj = foo(Instance::of(&shape).allow_none(true));
        assert_eq!(obj.get("x").unwrap(), Value::None);
    }

    #[test]
    fn instance_default_kwargs() {
        let (_, circle, _) = shapes();
        let obj = foo(Instance::of(&circle).default_kwargs([("r", Value::Int(2))]));
        let first = obj.get("x").unwrap();
        assert_eq!(first.as_object().unwrap().get("r").unwrap(), Value::Int(2));
        assert_eq!(obj.get("x").unwrap(), first);
        let other = foo(Instance::of(&circle).default_kwargs([("r", Value::Int(2))]));
        assert_ne!(other.get("x").unwrap(), first);
    }

    #[test]
    fn instance_cast() {
        let (_, circle, _) = shapes();
        let cast_circle = circle.clone();
        let t = Instance::of(&circle).castable([ValueKind::Int], move |value| {
            HasTraits::with_values(&cast_circle, [("r", value)]).map(Value::Object)
        });
        let value = accepts(t, 4);
        assert_eq!(value.as_object().unwrap().get("r").unwrap(), Value::Int(4));
    }

    #[test]
    fn forward_references() {
        let holder = Class::builder("Holder")
            .add_trait("item", Instance::forward("LaterClass").allow_none(true))
            .build();
        assert!(matches!(
            HasTraits::new(&holder).unwrap_err(),
            TraitError::UnresolvedClass { .. }
        ));
        let later = Class::builder("LaterClass").build();
        let obj = HasTraits::new(&holder).unwrap();
        obj.set("item", HasTraits::new(&later).unwrap()).unwrap();
    }

    #[test]
    fn types() {
        let (shape, circle, other) = shapes();
        assert_eq!(foo(Type::subclass_of(&shape)).get("x").unwrap(), Value::Class(shape.clone()));
        assert_eq!(accepts(Type::subclass_of(&shape), "Circle"), Value::Class(circle));
        assert!(matches!(
            rejects(Type::subclass_of(&shape), other),
            TraitError::Validation { .. }
        ));
        assert!(rejects(Type::subclass_of(&shape), "Nowhere").to_string().contains("a subclass of 'Shape'"));
    }

    #[test]
    fn this() {
        let node = Class::builder("Node").add_trait("parent", This::new()).build();
        let leaf = Class::builder("Leaf").base(&node).build();
        let a = HasTraits::new(&node).unwrap();
        assert_eq!(a.get("parent").unwrap(), Value::None);
        a.set("parent", HasTraits::new(&leaf).unwrap()).unwrap();
        let stranger = Class::builder("Stranger").build();
        assert!(a.set("parent", HasTraits::new(&stranger).unwrap()).is_err());
        a.set("parent", Value::None).unwrap();
    }
}

mod misc {
    use super::*;

    #[test]
    fn any_accepts_everything() {
        assert_eq!(foo(Any::new()).get("x").unwrap(), Value::None);
        assert_eq!(accepts(Any::new(), Value::list([1])), Value::list([1]));
    }

    #[test]
    fn unions_try_members_in_order() {
        let t = || Int::new().into_trait() | Unicode::new();
        assert_eq!(accepts(t(), 1), Value::Int(1));
        assert_eq!(accepts(t(), "a"), Value::str("a"));
        assert_eq!(
            rejects(t(), 1.5).to_string(),
            "The 'x' trait of a Foo instance expected an int or a unicode string, not the float 1.5."
        );
        assert_eq!(foo(t()).get("x").unwrap(), Value::Int(0));
        let coerced = Float::new().into_trait() | Unicode::new();
        assert_eq!(accepts(coerced, 1), Value::Float(1.0));
    }

    #[test]
    fn callables() {
        let f = Function::new("f", |_| Ok(Value::None));
        assert_eq!(accepts(Callable::new(), f.clone()), Value::Callable(f));
        let class = Class::builder("K").build();
        assert!(accepts(Callable::new(), class).as_class().is_some());
        assert!(rejects(Callable::new(), 1).to_string().contains("a callable"));
    }

    #[test]
    fn tcp_addresses() {
        assert_eq!(
            foo(TcpAddress::new()).get("x").unwrap(),
            Value::tuple([Value::str("127.0.0.1"), Value::Int(0)])
        );
        let addr = Value::list([Value::str("::1"), Value::Int(80)]);
        assert_eq!(
            accepts(TcpAddress::new(), addr),
            Value::tuple([Value::str("::1"), Value::Int(80)])
        );
        let bad = Value::tuple([Value::str("h"), Value::Int(70000)]);
        assert!(rejects(TcpAddress::new(), bad).to_string().contains("(ip, port)"));
    }

    #[test]
    fn regexes() {
        let value = accepts(CRegExp::new(), "a+b");
        assert_eq!(value.to_string(), "re.compile('a+b')");
        assert!(matches!(rejects(CRegExp::new(), "(unclosed"), TraitError::Validation { .. }));
    }
}

mod options {
    use super::*;

    #[test]
    fn allow_none() {
        let t = Int::new().allow_none(true);
        assert_eq!(t.info(), "an int or None");
        assert_eq!(accepts(t, Value::None), Value::None);
        assert!(rejects(Int::new(), Value::None).to_string().contains("the NoneType None"));
    }

    #[test]
    fn read_only() {
        let obj = foo(Int::new().read_only(true).default_value(1));
        assert_eq!(
            obj.set("x", 2).unwrap_err().to_string(),
            "The \"x\" trait is read-only."
        );
        obj.set_trait("x", 2).unwrap();
        assert_eq!(obj.get("x").unwrap(), Value::Int(2));
    }

    #[test]
    fn static_defaults_are_copied() {
        let class = Class::builder("Foo")
            .add_trait("x", List::new().default_value(Value::list([1])))
            .build();
        let a = HasTraits::new(&class).unwrap();
        let b = HasTraits::new(&class).unwrap();
        a.set("x", Value::list([1, 2])).unwrap();
        assert_eq!(b.get("x").unwrap(), Value::list([1]));
    }

    #[test]
    fn defaults_are_validated() {
        let obj = foo(Int::new().min(5).default_value(1));
        assert!(matches!(obj.get("x").unwrap_err(), TraitError::OutOfBounds { .. }));
    }

    #[test]
    fn dynamic_defaults_see_the_instance() {
        let class = Class::builder("Foo")
            .add_trait("base", Int::new().default_value(20))
            .add_trait(
                "x",
                Int::new().dynamic_default(|obj| {
                    let base = obj.get("base")?.as_int().unwrap_or_default();
                    Ok(Value::Int(base + 1))
                }),
            )
            .build();
        let obj = HasTraits::new(&class).unwrap();
        assert_eq!(obj.get("x").unwrap(), Value::Int(21));
    }

    #[test]
    fn metadata() {
        let t = Int::new().help("How many").tag("group", "net").config();
        assert_eq!(t.help_text(), "How many");
        assert!(t.is_configurable());
        assert_eq!(t.metadata("group"), Some(&Value::str("net")));
        assert_eq!(t.metadata_map().len(), 2);
        assert!(!Int::new().into_trait().is_configurable());
        assert!(!Int::new().tag("config", false).is_configurable());
    }

    #[test]
    fn binding() {
        let class = Class::builder("Foo")
            .add_trait("xs", List::of(Int::new()))
            .build();
        let t = class.trait_named("xs").unwrap();
        assert_eq!(t.name(), Some("xs"));
        assert_eq!(t.class_name(), Some("Foo"));
        assert_eq!(t.this_class(), Some(class.clone()));
        assert_eq!(t.type_name(), "List");
        assert!(Int::new().into_trait().name().is_none());
    }
}
