//! Tests for dynamic values.

use std::collections::HashSet;

use super::*;

mod equality {
    use super::*;

    #[test]
    fn ints_and_floats_differ() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Bool(true), Value::Int(1));
    }

    #[test]
    fn nan_equals_itself() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn lists_and_tuples_differ() {
        assert_ne!(Value::list([1, 2]), Value::tuple([1, 2]));
    }

    #[test]
    fn sets_and_dicts_ignore_order() {
        assert_eq!(Value::set([1, 2]), Value::set([2, 1]));
        assert_eq!(
            Value::dict([("a", 1), ("b", 2)]),
            Value::dict([("b", 2), ("a", 1)])
        );
    }

    #[test]
    fn hash_matches_equality() {
        let mut seen = HashSet::new();
        seen.insert(Value::set([1, 2]));
        seen.insert(Value::set([2, 1]));
        seen.insert(Value::dict([("a", 1)]));
        seen.insert(Value::dict([("a", 1)]));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn sentinels_compare_by_identity() {
        static OTHER: Sentinel = Sentinel::new("Undefined", "traitconf", "");
        assert_eq!(Value::undefined(), Value::undefined());
        assert_ne!(Value::undefined(), Value::Sentinel(&OTHER));
        assert!(Value::undefined().is_undefined());
        assert!(!Value::None.is_undefined());
    }

    #[test]
    fn callables_compare_by_identity() {
        let f = Callable::new("f", |_| Ok(Value::None));
        let g = Callable::new("f", |_| Ok(Value::None));
        assert_eq!(Value::Callable(f.clone()), Value::Callable(f.clone()));
        assert_ne!(Value::Callable(f), Value::Callable(g));
    }
}

mod conversions {
    use super::*;

    #[test]
    fn option_maps_to_none() {
        assert_eq!(Value::from(None::<i32>), Value::None);
        assert_eq!(Value::from(Some("x")), Value::str("x"));
    }

    #[test]
    fn set_drops_duplicates() {
        let Value::Set(items) = Value::set([1, 2, 1]) else {
            unreachable!()
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn to_items() {
        assert_eq!(Value::tuple([1, 2]).to_items(), Some(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(Value::Int(1).to_items(), None);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(!Value::list::<i32>([]).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(Value::undefined().is_truthy());
    }

    #[test]
    fn deep_copy_is_independent() {
        let original = Value::list([Value::list([1])]);
        let mut copy = original.deep_copy();
        if let Value::List(items) = &mut copy {
            items.push(Value::Int(2));
        }
        assert_eq!(original, Value::list([Value::list([1])]));
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::None.type_name(), "NoneType");
        assert_eq!(Value::dict([("a", 1)]).type_name(), "dict");
        assert_eq!(ValueKind::Class.type_name(), "type");
    }

    #[test]
    fn total_order_mixes_numbers() {
        let mut values = vec![Value::Float(2.5), Value::Int(1), Value::Bool(true), Value::Int(3)];
        values.sort_by(Value::total_cmp);
        assert_eq!(values[0], Value::Int(1));
        assert_eq!(values[2], Value::Float(2.5));
        assert_eq!(values[3], Value::Int(3));
        assert_eq!(Value::str("a").total_cmp(&Value::Int(9)), Ordering::Greater);
    }
}

mod json {
    use super::*;

    #[test]
    fn round_trip() {
        let value = Value::dict([
            ("n", Value::None),
            ("i", Value::Int(-4)),
            ("f", Value::Float(0.5)),
            ("s", Value::str("x")),
            ("l", Value::list([1, 2])),
        ]);
        let json = value.to_json().unwrap();
        assert_eq!(Value::from_json(&json), value);
    }

    #[test]
    fn tuples_and_sets_become_lists() {
        let json = Value::tuple([1]).to_json().unwrap();
        assert_eq!(Value::from_json(&json), Value::list([1]));
        let json = Value::set([1]).to_json().unwrap();
        assert_eq!(Value::from_json(&json), Value::list([1]));
    }

    #[test]
    fn int_keys_become_strings() {
        let json = Value::dict([(1, "a")]).to_json().unwrap();
        assert_eq!(json, serde_json::json!({"1": "a"}));
    }

    #[test]
    fn unsupported_values() {
        assert!(Value::bytes(b"x".to_vec()).to_json().is_err());
        assert!(Value::Float(f64::INFINITY).to_json().is_err());
        assert!(Value::undefined().to_json().is_err());
        let err = Value::dict([(Value::tuple([1]), 1)]).to_json().unwrap_err();
        assert!(err.to_string().contains("not JSON serializable"));
    }
}

mod display {
    use super::*;

    #[test]
    fn scalars() {
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::Bool(false).to_string(), "False");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Float(f64::NEG_INFINITY).to_string(), "-inf");
    }

    #[test]
    fn strings_pick_quotes() {
        assert_eq!(Value::str("abc").to_string(), "'abc'");
        assert_eq!(Value::str("it's").to_string(), "\"it's\"");
        assert_eq!(Value::str("a\nb").to_string(), "'a\\nb'");
        assert_eq!(Value::bytes(b"a'\x00".to_vec()).to_string(), "b'a\\'\\x00'");
    }

    #[test]
    fn containers() {
        assert_eq!(Value::list([1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::tuple([1]).to_string(), "(1,)");
        assert_eq!(Value::set::<i32>([]).to_string(), "set()");
        assert_eq!(Value::dict([("a", 1)]).to_string(), "{'a': 1}");
    }
}
