//! Tests for file loading.

use std::fs;

use tempfile::TempDir;

use super::*;
use crate::value::Value;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn value_at<'a>(config: &'a Config, section: &str, key: &str) -> Option<&'a Value> {
    config.section(section).and_then(|s| s.value(key))
}

mod finding {
    use super::*;

    #[test]
    fn first_directory_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(&second, "app.py", "");
        let expected = write(&first, "app.py", "");
        let dirs = [first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(find_file("app.py", &dirs).unwrap(), expected);
    }

    #[test]
    fn falls_through_missing_directories() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let expected = write(&second, "app.py", "");
        let dirs = [first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(find_file("app.py", &dirs).unwrap(), expected);
    }

    #[test]
    fn absolute_names_ignore_directories() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", "{}");
        let name = path.to_string_lossy().into_owned();
        assert_eq!(find_file(&name, &[PathBuf::from("/nonexistent")]).unwrap(), path);
    }

    #[test]
    fn missing_file_lists_search_path() {
        let dir = TempDir::new().unwrap();
        let err = find_file("app.py", &[dir.path().to_path_buf()]).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("app.py"));
    }

    #[test]
    fn target_of_missing_file_uses_first_directory() {
        let dir = TempDir::new().unwrap();
        let location = FileLocation::new("new.json", vec![dir.path().to_path_buf()]);
        assert_eq!(location.target(), dir.path().join("new.json"));
        assert_eq!(location.filename(), "new.json");
        assert_eq!(location.search_path().len(), 1);
    }

    #[test]
    fn write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.json");
        write_atomic(&path, "{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!dir.path().join("nested").join("out.json.tmp").exists());
    }
}

mod json_files {
    use super::*;

    fn sample() -> Config {
        let mut config = Config::new();
        config.set_path("Foo.a", Value::Int(1)).unwrap();
        config
            .set_path("Foo.names", Value::list([Value::str("x"), Value::str("y")]))
            .unwrap();
        config.set_path("Bar.Baz.on", Value::Bool(true)).unwrap();
        config
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let loader = JsonFileConfigLoader::new("app.json", vec![dir.path().to_path_buf()]);
        let path = loader.save(&sample()).unwrap();
        assert_eq!(path, dir.path().join("app.json"));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"version\": 1"));
        assert_eq!(loader.load_config().unwrap(), sample());
        assert_eq!(loader.location().filename(), "app.json");
    }

    #[test]
    fn missing_version_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", r#"{"Foo": {"a": 1}}"#);
        let config = load_file(&path).unwrap();
        assert_eq!(value_at(&config, "Foo", "a"), Some(&Value::Int(1)));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", r#"{"version": 2, "Foo": {}}"#);
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion { ref version, .. } if version == "2"));
    }

    #[test]
    fn top_level_must_be_an_object() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", "[1, 2]");
        assert!(matches!(load_file(&path), Err(ConfigError::JsonShape { .. })));
    }

    #[test]
    fn sections_must_be_objects() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", r#"{"Foo": 1}"#);
        assert!(matches!(load_file(&path), Err(ConfigError::JsonShape { .. })));
    }

    #[test]
    fn invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.json", "{not json");
        assert!(matches!(load_file(&path), Err(ConfigError::JsonParse { .. })));
    }

    #[test]
    fn edit_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let loader = JsonFileConfigLoader::new("app.json", vec![dir.path().to_path_buf()]);
        let edited = loader
            .edit(|config| config.set_path("Foo.a", Value::Int(3)))
            .unwrap();
        assert_eq!(value_at(&edited, "Foo", "a"), Some(&Value::Int(3)));

        let edited = loader
            .edit(|config| config.set_path("Foo.b", Value::Int(4)))
            .unwrap();
        assert_eq!(value_at(&edited, "Foo", "a"), Some(&Value::Int(3)));
        assert_eq!(value_at(&loader.load_config().unwrap(), "Foo", "b"), Some(&Value::Int(4)));
    }

    #[test]
    fn failed_edit_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let loader = JsonFileConfigLoader::new("app.json", vec![dir.path().to_path_buf()]);
        let result = loader.edit(|_| Err(ConfigError::Invalid("refused".to_owned())));
        assert!(result.is_err());
        assert!(!dir.path().join("app.json").exists());
    }
}

mod scripts {
    use super::*;

    #[test]
    fn assignments_and_comments() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "app.py",
            "# settings\nc = get_config()\n\nc.Foo.a = 10\nc.Foo.name = 'x'\nc.Foo.Bar.deep = [1, 2]\n",
        );
        let config = load_file(&path).unwrap();
        assert_eq!(value_at(&config, "Foo", "a"), Some(&Value::Int(10)));
        assert_eq!(value_at(&config, "Foo", "name"), Some(&Value::str("x")));
        assert!(config.contains("Foo.Bar.deep"));
    }

    #[test]
    fn methods_edit_existing_values() {
        let loader = ScriptFileLoader::new("app.py", Vec::new());
        let config = loader
            .load_str(
                Path::new("app.py"),
                "c.Foo.items = [1]\nc.Foo.items.append(2)\nc.Foo.items.insert(0, 0)\nc.Foo.d = {}\nc.Foo.d.update({'a': 1})\n",
            )
            .unwrap();
        assert_eq!(value_at(&config, "Foo", "items"), Some(&Value::list([0, 1, 2])));
        assert_eq!(value_at(&config, "Foo", "d"), Some(&Value::dict([("a", 1)])));
    }

    #[test]
    fn methods_on_missing_keys_are_lazy() {
        let loader = ScriptFileLoader::new("app.py", Vec::new());
        let config = loader
            .load_str(Path::new("app.py"), "c.Foo.items.append('x')\nc.Foo.items.prepend(['a'])\n")
            .unwrap();
        let lazy = config.section("Foo").unwrap().get("items").unwrap().as_lazy().unwrap();
        assert_eq!(lazy.resolve(&Value::list(["m"])), Value::list(["a", "m", "x"]));
    }

    #[test]
    fn subconfig_has_lower_priority() {
        let dir = TempDir::new().unwrap();
        write(&dir, "base.py", "c.Foo.a = 1\nc.Foo.b = 1\nc.Foo.items = [1]\n");
        let path = write(
            &dir,
            "app.py",
            "c.Foo.items.append(2)\nload_subconfig('base.py')\nc.Foo.a = 2\n",
        );
        let config = load_file(&path).unwrap();
        assert_eq!(value_at(&config, "Foo", "a"), Some(&Value::Int(2)));
        assert_eq!(value_at(&config, "Foo", "b"), Some(&Value::Int(1)));
        assert_eq!(value_at(&config, "Foo", "items"), Some(&Value::list([1, 2])));
    }

    #[test]
    fn missing_subconfig_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.py", "load_subconfig('nope.py')\nc.Foo.a = 1\n");
        assert!(load_file(&path).unwrap().contains("Foo.a"));
    }

    #[test]
    fn errors_name_the_line() {
        let loader = ScriptFileLoader::new("app.py", Vec::new());
        let err = loader
            .load_str(Path::new("app.py"), "# ok\n\nc.Foo.a = [1,\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Script { line: 3, .. }));
        assert!(err.to_string().starts_with("app.py:3:"));
    }

    #[test]
    fn unsupported_statement() {
        let loader = ScriptFileLoader::new("app.py", Vec::new());
        assert!(loader.load_str(Path::new("app.py"), "import os\n").is_err());
        assert!(loader.load_str(Path::new("app.py"), "c.Foo = 1\n").is_err());
    }

    #[test]
    fn later_files_take_priority() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.py", "c.Foo.a = 1\nc.Foo.b = 1\nc.Foo.items = [1]\n");
        write(&dir, "b.py", "c.Foo.a = 2\nc.Foo.items.append(3)\n");
        let config =
            load_config_files(&["a.py", "missing.py", "b.py"], &[dir.path().to_path_buf()]).unwrap();
        assert_eq!(value_at(&config, "Foo", "a"), Some(&Value::Int(2)));
        assert_eq!(value_at(&config, "Foo", "b"), Some(&Value::Int(1)));
        assert_eq!(value_at(&config, "Foo", "items"), Some(&Value::list([1, 3])));
    }

    #[test]
    fn broken_file_stops_loading() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.py", "c.Foo.a = \n");
        assert!(load_config_files(&["a.py"], &[dir.path().to_path_buf()]).is_err());
    }
}
