//! Tests for deferred container edits.

use super::*;

mod lists {
    use super::*;

    #[test]
    fn append_and_extend() {
        let mut lazy = LazyValue::new();
        lazy.append(3);
        lazy.extend([Value::Int(4), Value::Int(5)]);
        assert_eq!(lazy.get_value(&Value::list([1, 2])), Value::list([1, 2, 3, 4, 5]));
    }

    #[test]
    fn later_prepends_go_first() {
        let mut lazy = LazyValue::new();
        lazy.prepend([Value::Int(2)]);
        lazy.prepend([Value::Int(0), Value::Int(1)]);
        assert_eq!(lazy.get_value(&Value::list([3])), Value::list([0, 1, 2, 3]));
    }

    #[test]
    fn insert_uses_list_insert_semantics() {
        let mut lazy = LazyValue::new();
        lazy.insert(1, "b");
        lazy.insert(-1, "x");
        lazy.insert(100, "end");
        let result = lazy.get_value(&Value::list(["a", "c"]));
        assert_eq!(result, Value::list(["a", "b", "x", "c", "end"]));
    }

    #[test]
    fn negative_insert_clamps_to_front() {
        let mut lazy = LazyValue::new();
        lazy.insert(-10, 0);
        assert_eq!(lazy.get_value(&Value::list([1])), Value::list([0, 1]));
    }

    #[test]
    fn initial_value_is_not_modified() {
        let mut lazy = LazyValue::new();
        lazy.append(2);
        let initial = Value::list([1]);
        let _ = lazy.get_value(&initial);
        assert_eq!(initial, Value::list([1]));
    }

    #[test]
    fn get_value_is_cached() {
        let mut lazy = LazyValue::new();
        lazy.append(2);
        assert_eq!(lazy.get_value(&Value::list([1])), Value::list([1, 2]));
        assert_eq!(lazy.get_value(&Value::list([9])), Value::list([1, 2]));
        assert_eq!(lazy.resolve(&Value::list([9])), Value::list([9, 2]));
    }
}

mod updates {
    use super::*;

    #[test]
    fn dict_update() {
        let mut lazy = LazyValue::new();
        lazy.update(&Value::dict([("b", 2), ("a", 10)])).unwrap();
        let result = lazy.get_value(&Value::dict([("a", 1)]));
        assert_eq!(result, Value::dict([("a", 10), ("b", 2)]));
    }

    #[test]
    fn set_add_and_update() {
        let mut lazy = LazyValue::new();
        lazy.add(3).unwrap();
        lazy.update(&Value::list([4, 5])).unwrap();
        let result = lazy.get_value(&Value::set([1]));
        assert_eq!(result, Value::set([1, 3, 4, 5]));
    }

    #[test]
    fn dict_update_after_set_edits_is_allowed() {
        let mut lazy = LazyValue::new();
        lazy.add(1).unwrap();
        lazy.update(&Value::dict([("k", 1)])).unwrap();
        assert_eq!(lazy.get_value(&Value::set([0])), Value::set([
            Value::Int(0),
            Value::Int(1),
            Value::str("k"),
        ]));
    }

    #[test]
    fn set_edits_after_dict_update_fail() {
        let mut lazy = LazyValue::new();
        lazy.update(&Value::dict([("a", 1)])).unwrap();
        assert!(lazy.add(1).is_err());
        assert!(lazy.update(&Value::list([1])).is_err());
    }

    #[test]
    fn scalar_update_fails() {
        let mut lazy = LazyValue::new();
        assert!(lazy.update(&Value::Int(1)).is_err());
    }

    #[test]
    fn non_containers_pass_through() {
        let mut lazy = LazyValue::new();
        lazy.append(1);
        assert_eq!(lazy.get_value(&Value::Int(5)), Value::Int(5));
    }
}

mod merging {
    use super::*;

    #[test]
    fn lazy_into_lazy_orders_edits() {
        let mut mine = LazyValue::new();
        mine.append("mine");
        mine.prepend([Value::str("mine-front")]);
        let mut theirs = LazyValue::new();
        theirs.append("theirs");
        theirs.prepend([Value::str("theirs-front")]);

        let merged = mine.merge_into(&ConfigItem::Lazy(theirs));
        assert_eq!(
            merged.as_lazy().unwrap().get_value(&Value::list(["base"])),
            Value::list(["mine-front", "theirs-front", "base", "theirs", "mine"])
        );
    }

    #[test]
    fn lazy_dict_updates_prefer_mine() {
        let mut mine = LazyValue::new();
        mine.update(&Value::dict([("a", 1)])).unwrap();
        let mut theirs = LazyValue::new();
        theirs.update(&Value::dict([("a", 2), ("b", 2)])).unwrap();

        let merged = mine.merge_into(&ConfigItem::Lazy(theirs));
        let lazy = merged.as_lazy().unwrap();
        assert_eq!(lazy.get_value(&Value::Dict(ValueMap::new())), Value::dict([("a", 1), ("b", 2)]));
    }

    #[test]
    fn lazy_into_value_applies() {
        let mut mine = LazyValue::new();
        mine.append(2);
        let merged = mine.merge_into(&ConfigItem::Value(Value::list([1])));
        assert_eq!(merged, ConfigItem::Value(Value::list([1, 2])));
    }

    #[test]
    fn section_replaces_lazy() {
        let mut mine = LazyValue::new();
        mine.append(2);
        let merged = mine.merge_into(&ConfigItem::Section(Config::new()));
        assert_eq!(merged, ConfigItem::Section(Config::new()));
    }
}

mod describe {
    use super::*;

    #[test]
    fn empty_until_edited() {
        let mut lazy = LazyValue::new();
        assert!(lazy.is_empty());
        lazy.insert(0, 1);
        assert!(!lazy.is_empty());
    }

    #[test]
    fn to_dict_lists_edits() {
        let mut lazy = LazyValue::new();
        lazy.append(1);
        lazy.insert(0, 2);
        let dict = lazy.to_dict();
        let map = dict.as_dict().unwrap();
        assert_eq!(map.get(&Value::str("extend")), Some(&Value::list([1])));
        assert_eq!(
            map.get(&Value::str("inserts")),
            Some(&Value::list([Value::tuple([0, 2])]))
        );
        assert!(!map.contains_key(&Value::str("prepend")));
    }

    #[test]
    fn display_shows_edits_then_value() {
        let mut lazy = LazyValue::new();
        lazy.append(1);
        assert_eq!(lazy.to_string(), "<LazyValue {'extend': [1]}>");
        let _ = lazy.get_value(&Value::list([0]));
        assert_eq!(lazy.to_string(), "<LazyValue value=[0, 1]>");
    }

    #[test]
    fn equality_ignores_cache() {
        let mut a = LazyValue::new();
        a.append(1);
        let b = a.clone();
        let _ = a.get_value(&Value::list([0]));
        assert_eq!(a, b);
    }
}
