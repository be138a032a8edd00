//! Tests for the key=value command-line loader.

use super::*;

fn flag_config(section: &str, key: &str, value: Value) -> Config {
    let mut config = Config::new();
    config.section_mut(section).unwrap().insert(key, value).unwrap();
    config
}

fn loader() -> KeyValueConfigLoader {
    KeyValueConfigLoader::new()
        .alias("i", "Foo.i")
        .flag("enable", flag_config("Bar", "enabled", Value::Bool(true)), "Enable Bar")
        .flag("disable", flag_config("Bar", "enabled", Value::Bool(false)), "Disable Bar")
}

fn value_at<'a>(config: &'a Config, section: &str, key: &str) -> Option<&'a Value> {
    config.section(section).and_then(|s| s.value(key))
}

mod assignments {
    use super::*;

    #[test]
    fn alias_and_flag() {
        let loaded = loader().load_config(&["--i=5", "--enable"]).unwrap();
        assert_eq!(value_at(&loaded.config, "Foo", "i"), Some(&Value::Int(5)));
        assert_eq!(value_at(&loaded.config, "Bar", "enabled"), Some(&Value::Bool(true)));
        assert!(loaded.extra_args.is_empty());
    }

    #[test]
    fn extra_arguments_keep_order() {
        let loaded = loader()
            .load_config(&["--Bar.b=5", "extra", "--disable", "more"])
            .unwrap();
        assert_eq!(value_at(&loaded.config, "Bar", "b"), Some(&Value::Int(5)));
        assert_eq!(value_at(&loaded.config, "Bar", "enabled"), Some(&Value::Bool(false)));
        assert_eq!(loaded.extra_args, ["extra", "more"]);
    }

    #[test]
    fn quoted_numbers_stay_strings() {
        let loaded = loader().load_config(&["--Foo.a=4", "--Foo.b='4'"]).unwrap();
        assert_eq!(value_at(&loaded.config, "Foo", "a"), Some(&Value::Int(4)));
        assert_eq!(value_at(&loaded.config, "Foo", "b"), Some(&Value::str("4")));
    }

    #[test]
    fn bare_words_become_strings() {
        let loaded = loader().load_config(&["--Foo.name=brian"]).unwrap();
        assert_eq!(value_at(&loaded.config, "Foo", "name"), Some(&Value::str("brian")));
    }

    #[test]
    fn literals_parse() {
        let loaded = loader()
            .load_config(&["--Foo.items=[1, 'a']", "--Foo.on=True", "--Foo.none=None"])
            .unwrap();
        assert_eq!(
            value_at(&loaded.config, "Foo", "items"),
            Some(&Value::list([Value::Int(1), Value::str("a")]))
        );
        assert_eq!(value_at(&loaded.config, "Foo", "on"), Some(&Value::Bool(true)));
        assert_eq!(value_at(&loaded.config, "Foo", "none"), Some(&Value::None));
    }

    #[test]
    fn later_assignment_wins() {
        let loaded = loader().load_config(&["--Foo.a=1", "--Foo.a=2"]).unwrap();
        assert_eq!(value_at(&loaded.config, "Foo", "a"), Some(&Value::Int(2)));
    }

    #[test]
    fn nested_sections() {
        let loaded = loader().load_config(&["--Foo.Bar.x=1"]).unwrap();
        assert!(loaded.config.contains("Foo.Bar.x"));
    }

    #[test]
    fn flag_keeps_other_keys_of_the_section() {
        let loaded = loader().load_config(&["--Bar.b=1", "--enable"]).unwrap();
        assert_eq!(value_at(&loaded.config, "Bar", "b"), Some(&Value::Int(1)));
        assert_eq!(value_at(&loaded.config, "Bar", "enabled"), Some(&Value::Bool(true)));
    }

    #[test]
    fn unknown_alias_is_stored_at_top_level() {
        let loaded = loader().load_config(&["--unknown=1"]).unwrap();
        assert_eq!(loaded.config.value("unknown"), Some(&Value::Int(1)));
    }
}

mod extras {
    use super::*;

    #[test]
    fn double_dash_ends_options() {
        let loaded = loader()
            .load_config(&["--Foo.a=1", "--", "--Foo.b=2", "--enable"])
            .unwrap();
        assert!(loaded.config.contains("Foo.a"));
        assert!(!loaded.config.contains("Foo.b"));
        assert!(!loaded.config.contains("Bar"));
        assert_eq!(loaded.extra_args, ["--Foo.b=2", "--enable"]);
    }

    #[test]
    fn lone_dash_is_kept() {
        let loaded = loader().load_config(&["-", "file"]).unwrap();
        assert_eq!(loaded.extra_args, ["-", "file"]);
    }

    #[test]
    fn empty_argv() {
        let loaded = loader().load_config::<&str>(&[]).unwrap();
        assert!(loaded.config.is_empty());
        assert!(loaded.extra_args.is_empty());
    }
}

mod errors {
    use super::*;

    fn message(argv: &[&str]) -> String {
        loader().load_config(argv).unwrap_err().to_string()
    }

    #[test]
    fn unknown_flag() {
        assert!(message(&["--nope"]).contains("Unrecognized flag: '--nope'"));
    }

    #[test]
    fn single_dash_assignment_suggests_double_dash() {
        assert!(message(&["-Foo.a=1"]).contains("did you mean '--Foo.a=1'?"));
    }

    #[test]
    fn malformed_option() {
        let text = message(&["--Foo..a=1"]);
        assert!(text.contains("Invalid argument: '--Foo..a=1'"));
        assert!(!text.contains("did you mean"));
    }

    #[test]
    fn scalar_for_a_section() {
        assert!(message(&["--Foo.Bar=1"]).contains("Invalid argument: '--Foo.Bar=1'"));
    }

    #[test]
    fn errors_are_argument_errors() {
        let err = loader().load_config(&["--nope"]).unwrap_err();
        assert!(matches!(err, ConfigError::Argument(_)));
    }
}

mod rhs {
    use super::*;

    #[test]
    fn items_build_a_list() {
        let mut config = Config::new();
        exec_config_str(
            &mut config,
            "Foo.items",
            Rhs::Items(vec!["1".into(), "b".into()]),
        )
        .unwrap();
        assert_eq!(
            value_at(&config, "Foo", "items"),
            Some(&Value::list([Value::Int(1), Value::str("b")]))
        );
    }

    #[test]
    fn single_bracketed_item_is_a_literal() {
        let mut config = Config::new();
        exec_config_str(&mut config, "Foo.items", Rhs::Items(vec!["[1, 2]".into()])).unwrap();
        assert_eq!(value_at(&config, "Foo", "items"), Some(&Value::list([1, 2])));
    }

    #[test]
    fn dict_pairs() {
        let mut config = Config::new();
        exec_config_str(
            &mut config,
            "Foo.d",
            Rhs::Dict(vec![
                DictItem::Pair("a".into(), "1".into()),
                DictItem::Pair("b".into(), "x".into()),
            ]),
        )
        .unwrap();
        assert_eq!(
            value_at(&config, "Foo", "d"),
            Some(&Value::dict([("a", Value::Int(1)), ("b", Value::str("x"))]))
        );
    }

    #[test]
    fn dict_literal() {
        let mut config = Config::new();
        exec_config_str(
            &mut config,
            "Foo.d",
            Rhs::Dict(vec![DictItem::Literal("{'a': 1}".into())]),
        )
        .unwrap();
        assert_eq!(value_at(&config, "Foo", "d"), Some(&Value::dict([("a", 1)])));
    }

    #[test]
    fn dict_literal_among_pairs_fails() {
        let mut config = Config::new();
        let result = exec_config_str(
            &mut config,
            "Foo.d",
            Rhs::Dict(vec![
                DictItem::Pair("a".into(), "1".into()),
                DictItem::Literal("{}".into()),
            ]),
        );
        assert!(result.is_err());
    }
}
