//! Tests for the JSON settings store.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use super::*;

fn object(value: serde_json::Value) -> JsonObject {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

mod updating {
    use super::*;

    #[test]
    fn nested_objects_merge() {
        let mut target = object(json!({"a": {"x": 1, "y": 2}, "b": 1}));
        recursive_update(&mut target, &object(json!({"a": {"y": 3, "z": 4}})));
        assert_eq!(target, object(json!({"a": {"x": 1, "y": 3, "z": 4}, "b": 1})));
    }

    #[test]
    fn null_deletes() {
        let mut target = object(json!({"a": 1, "b": 2}));
        recursive_update(&mut target, &object(json!({"a": null})));
        assert_eq!(target, object(json!({"b": 2})));
    }

    #[test]
    fn emptied_objects_are_removed() {
        let mut target = object(json!({"a": {"x": 1}, "b": 2}));
        recursive_update(&mut target, &object(json!({"a": {"x": null}})));
        assert_eq!(target, object(json!({"b": 2})));
    }

    #[test]
    fn object_replaces_scalar() {
        let mut target = object(json!({"a": 1}));
        recursive_update(&mut target, &object(json!({"a": {"x": 1}})));
        assert_eq!(target, object(json!({"a": {"x": 1}})));
    }

    #[test]
    fn lists_are_replaced() {
        let mut target = object(json!({"a": [1, 2]}));
        recursive_update(&mut target, &object(json!({"a": [3]})));
        assert_eq!(target, object(json!({"a": [3]})));
    }
}

mod store {
    use super::*;

    #[test]
    fn missing_section_is_empty() {
        let dir = TempDir::new().unwrap();
        let manager = JsonConfigManager::new(dir.path());
        assert!(manager.get("notebook").unwrap().is_empty());
    }

    #[test]
    fn set_then_get() {
        let dir = TempDir::new().unwrap();
        let manager = JsonConfigManager::new(dir.path().join("nbconfig"));
        let data = object(json!({"load_extensions": {"a": true}}));
        manager.set("notebook", &data).unwrap();
        assert!(manager.file_name("notebook").is_file());
        assert_eq!(manager.get("notebook").unwrap(), data);
    }

    #[test]
    fn update_merges_and_writes() {
        let dir = TempDir::new().unwrap();
        let manager = JsonConfigManager::new(dir.path());
        manager.set("tree", &object(json!({"a": 1, "b": {"c": 2}}))).unwrap();

        let updated = manager
            .update("tree", &object(json!({"a": null, "b": {"d": 3}})))
            .unwrap();
        let expected = object(json!({"b": {"c": 2, "d": 3}}));
        assert_eq!(updated, expected);
        assert_eq!(manager.get("tree").unwrap(), expected);
    }

    #[test]
    fn fragments_apply_in_name_order_before_main_file() {
        let dir = TempDir::new().unwrap();
        let manager = JsonConfigManager::new(dir.path());
        let drop_in = manager.directory("notebook");
        fs::create_dir_all(&drop_in).unwrap();
        fs::write(drop_in.join("10-b.json"), r#"{"x": "b", "y": "b"}"#).unwrap();
        fs::write(drop_in.join("01-a.json"), r#"{"x": "a", "z": "a"}"#).unwrap();
        fs::write(drop_in.join("ignored.txt"), "not json").unwrap();
        manager.set("notebook", &object(json!({"y": "main"}))).unwrap();

        let data = manager.get("notebook").unwrap();
        assert_eq!(data, object(json!({"x": "b", "y": "main", "z": "a"})));
    }

    #[test]
    fn fragments_can_be_skipped() {
        let dir = TempDir::new().unwrap();
        let manager = JsonConfigManager::new(dir.path()).read_directory(false);
        let drop_in = manager.directory("notebook");
        fs::create_dir_all(&drop_in).unwrap();
        fs::write(drop_in.join("a.json"), r#"{"x": 1}"#).unwrap();
        assert!(manager.get("notebook").unwrap().is_empty());
    }

    #[test]
    fn paths() {
        let manager = JsonConfigManager::new("/etc/app");
        assert_eq!(manager.config_dir(), Path::new("/etc/app"));
        assert_eq!(manager.file_name("tree"), Path::new("/etc/app/tree.json"));
        assert_eq!(manager.directory("tree"), Path::new("/etc/app/tree.d"));
    }

    #[test]
    fn non_object_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let manager = JsonConfigManager::new(dir.path());
        fs::write(manager.file_name("tree"), "[1]").unwrap();
        assert!(matches!(
            manager.get("tree"),
            Err(ManagerError::NotAnObject { .. })
        ));
    }

    #[test]
    fn invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let manager = JsonConfigManager::new(dir.path());
        fs::write(manager.file_name("tree"), "{").unwrap();
        assert!(matches!(manager.get("tree"), Err(ManagerError::Parse { .. })));
    }
}
