//! The nested config tree.

use std::fmt;

use indexmap::IndexMap;

use crate::value::Value;

use super::error::ConfigError;
use super::lazy::LazyValue;

/// One entry of a [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigItem {
    /// A nested section, stored under a section key.
    Section(Config),
    /// A concrete value.
    Value(Value),
    /// Container edits waiting for the value they apply to.
    Lazy(LazyValue),
}

impl ConfigItem {
    fn deep_copy(&self) -> Self {
        match self {
            Self::Section(section) => Self::Section(section.clone()),
            Self::Value(value) => Self::Value(value.deep_copy()),
            Self::Lazy(lazy) => Self::Lazy(lazy.clone()),
        }
    }

    /// An empty lazy value has no effect yet.
    fn is_placeholder(&self) -> bool {
        matches!(self, Self::Lazy(lazy) if lazy.is_empty())
    }

    #[must_use]
    pub const fn as_section(&self) -> Option<&Config> {
        match self {
            Self::Section(section) => Some(section),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_lazy(&self) -> Option<&LazyValue> {
        match self {
            Self::Lazy(lazy) => Some(lazy),
            _ => None,
        }
    }

    fn to_json(&self) -> Result<serde_json::Value, ConfigError> {
        match self {
            Self::Section(section) => section.to_json().map(serde_json::Value::Object),
            Self::Value(value) => Ok(value.to_json()?),
            Self::Lazy(lazy) => Ok(lazy.to_dict().to_json()?),
        }
    }
}

impl From<Value> for ConfigItem {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl fmt::Display for ConfigItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Section(section) => write!(f, "{section}"),
            Self::Value(value) => write!(f, "{value}"),
            Self::Lazy(lazy) => write!(f, "{lazy}"),
        }
    }
}

/// A leaf key set to different values by two configs.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    /// The value in the config asked about
    pub mine: ConfigItem,
    /// The value in the other config
    pub theirs: ConfigItem,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ignored, using {}", self.theirs, self.mine)
    }
}

/// Per-section collisions between two configs.
pub type Collisions = IndexMap<String, IndexMap<String, Collision>>;

/// A tree of config sections.
///
/// Keys whose first character is uppercase (or any non-letter other than
/// `_`) are section keys and always hold a nested [`Config`]. Other keys
/// hold values or [`LazyValue`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    entries: IndexMap<String, ConfigItem>,
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True for keys that name sections.
    #[must_use]
    pub fn is_section_key(key: &str) -> bool {
        key.chars()
            .next()
            .is_some_and(|c| !c.is_lowercase() && c != '_')
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigItem> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigItem> {
        self.entries.get_mut(key)
    }

    #[must_use]
    pub fn section(&self, key: &str) -> Option<&Self> {
        self.get(key).and_then(ConfigItem::as_section)
    }

    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(ConfigItem::as_value)
    }

    /// The section under `key`, created empty when missing.
    ///
    /// # Errors
    ///
    /// Fails when `key` is not a section key.
    pub fn section_mut(&mut self, key: &str) -> Result<&mut Self, ConfigError> {
        if !Self::is_section_key(key) {
            return Err(ConfigError::Invalid(format!("'{key}' is not a section key")));
        }
        let item = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| ConfigItem::Section(Self::new()));
        match item {
            ConfigItem::Section(section) => Ok(section),
            other => Err(ConfigError::section_value(key, &*other)),
        }
    }

    /// The lazy value under `key`, created empty when missing.
    ///
    /// # Errors
    ///
    /// Fails for section keys, keys starting with `_`, and keys that
    /// already hold a concrete value.
    pub fn lazy_mut(&mut self, key: &str) -> Result<&mut LazyValue, ConfigError> {
        if Self::is_section_key(key) || key.starts_with('_') {
            return Err(ConfigError::Invalid(format!("'{key}' cannot hold a lazy value")));
        }
        let item = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| ConfigItem::Lazy(LazyValue::new()));
        match item {
            ConfigItem::Lazy(lazy) => Ok(lazy),
            _ => Err(ConfigError::Invalid(format!("'{key}' already holds a value"))),
        }
    }

    /// Stores `item` under `key`, replacing what was there.
    ///
    /// # Errors
    ///
    /// Fails when `key` is a section key and `item` is not a section.
    pub fn insert(&mut self, key: impl Into<String>, item: impl Into<ConfigItem>) -> Result<(), ConfigError> {
        let key = key.into();
        let item = item.into();
        if Self::is_section_key(&key) && !matches!(item, ConfigItem::Section(_)) {
            return Err(ConfigError::section_value(key, item));
        }
        self.entries.insert(key, item);
        Ok(())
    }

    /// Assigns `value` at a dotted path such as `Foo.Bar.key`, creating
    /// sections on the way. A dict assigned to a section key becomes a
    /// section.
    ///
    /// # Errors
    ///
    /// Fails when an inner path component is not a section key, or when a
    /// non-dict is assigned to a section key.
    pub fn set_path(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        let mut parts: Vec<&str> = path.split('.').collect();
        let Some(last) = parts.pop() else {
            return Err(ConfigError::Invalid(format!("empty config path '{path}'")));
        };
        let mut section = self;
        for part in parts {
            section = section.section_mut(part)?;
        }
        if Self::is_section_key(last) {
            let nested = Self::from_value(&value).ok_or_else(|| ConfigError::section_value(last, &value))?;
            return section.insert(last, nested);
        }
        section.insert(last, value)
    }

    /// Builds a section tree from a dict with string keys.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let mut config = Self::new();
        for (key, item) in value.to_plain().as_dict()? {
            let key = key.as_str()?;
            if Self::is_section_key(key) {
                config.insert(key, Self::from_value(item)?).ok()?;
            } else {
                config.insert(key, item.clone()).ok()?;
            }
        }
        Some(config)
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigItem> {
        self.entries.shift_remove(key)
    }

    /// True when `key` holds something with an effect. A dotted key walks
    /// sections; an empty lazy value counts as absent.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        match key.split_once('.') {
            Some((first, rest)) => self.section(first).is_some_and(|s| s.contains(rest)),
            None => self.get(key).is_some_and(|item| !item.is_placeholder()),
        }
    }

    #[must_use]
    pub fn has_section(&self, key: &str) -> bool {
        Self::is_section_key(key) && self.section(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigItem)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every non-section entry with its dotted path, depth first.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, &ConfigItem)> {
        let mut out = Vec::new();
        for (key, item) in &self.entries {
            match item {
                ConfigItem::Section(section) => out.extend(
                    section
                        .flatten()
                        .into_iter()
                        .map(|(path, inner)| (format!("{key}.{path}"), inner)),
                ),
                _ => out.push((key.clone(), item)),
            }
        }
        out
    }

    /// Merges `other` into this config. Existing values win.
    ///
    /// Missing keys are copied from `other`; sections merge recursively;
    /// a lazy value here is folded into `other`'s item with
    /// [`LazyValue::merge_into`]. An empty lazy value counts as missing.
    pub fn merge(&mut self, other: &Self) {
        for (key, theirs) in &other.entries {
            let Some(slot) = self.entries.get_mut(key) else {
                self.entries.insert(key.clone(), theirs.deep_copy());
                continue;
            };
            match slot {
                ConfigItem::Section(mine) => {
                    if let ConfigItem::Section(theirs) = theirs {
                        mine.merge(theirs);
                    }
                }
                ConfigItem::Lazy(mine) => {
                    let merged = mine.merge_into(theirs);
                    *slot = merged;
                }
                ConfigItem::Value(_) => {}
            }
        }
    }

    /// Replaces entries section by section, the way a flag applies:
    /// keys of `other` overwrite keys in the same section, other keys in
    /// that section are kept.
    ///
    /// # Errors
    ///
    /// Fails when `other` puts a non-section under a section key.
    pub fn update_sections(&mut self, other: &Self) -> Result<(), ConfigError> {
        for (key, item) in &other.entries {
            match item {
                ConfigItem::Section(theirs) => {
                    let mine = self.section_mut(key)?;
                    for (inner, value) in &theirs.entries {
                        mine.entries.insert(inner.clone(), value.deep_copy());
                    }
                }
                _ => self.insert(key.clone(), item.deep_copy())?,
            }
        }
        Ok(())
    }

    /// Leaf keys that both configs set, to different values, per top-level
    /// section.
    #[must_use]
    pub fn collisions(&self, other: &Self) -> Collisions {
        let mut found = Collisions::new();
        for (name, item) in &self.entries {
            let (Some(mine), Some(theirs)) = (item.as_section(), other.section(name)) else {
                continue;
            };
            for (key, value) in &mine.entries {
                if let Some(other_value) = theirs.get(key) {
                    if other_value != value {
                        found.entry(name.clone()).or_default().insert(
                            key.clone(),
                            Collision {
                                mine: value.clone(),
                                theirs: other_value.clone(),
                            },
                        );
                    }
                }
            }
        }
        found
    }

    /// The JSON form of this config. Lazy values appear as their
    /// [`LazyValue::to_dict`] description.
    ///
    /// # Errors
    ///
    /// Fails when a value has no JSON form.
    pub fn to_json(&self) -> Result<serde_json::Map<String, serde_json::Value>, ConfigError> {
        self.entries
            .iter()
            .map(|(key, item)| Ok((key.clone(), item.to_json()?)))
            .collect()
    }

    /// Builds a config from a JSON object. Objects under section keys
    /// become sections.
    ///
    /// # Errors
    ///
    /// Fails when a section key holds something other than an object.
    pub fn from_json(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        for (key, json) in map {
            if Self::is_section_key(key) {
                let serde_json::Value::Object(inner) = json else {
                    return Err(ConfigError::section_value(key.clone(), Value::from_json(json)));
                };
                config.insert(key.clone(), Self::from_json(inner)?)?;
            } else {
                config.insert(key.clone(), Value::from_json(json))?;
            }
        }
        Ok(config)
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a String, &'a ConfigItem);
    type IntoIter = indexmap::map::Iter<'a, String, ConfigItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, item)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {item}", Value::str(key.as_str()))?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
