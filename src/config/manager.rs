//! A JSON-backed settings store with drop-in fragments.
//!
//! Section `name` lives in `<dir>/name.json`. Fragments in
//! `<dir>/name.d/*.json` are applied first, in file name order, so the
//! main file overrides them.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::defaults::{self, DROP_IN_SUFFIX, JSON_EXTENSION};
use super::loader::write_atomic;

/// A section's data.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Errors from [`JsonConfigManager`].
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Failed to read a settings file or list a drop-in directory.
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A settings file is not valid JSON.
    #[error("Failed to parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A settings file holds something other than an object.
    #[error("Settings file '{}' must contain a JSON object", path.display())]
    NotAnObject { path: PathBuf },

    /// Failed to serialize the data.
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Failed to write a settings file.
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No platform config directory is known.
    #[error("Could not determine the user config directory")]
    NoConfigDir,
}

/// Merges `new` into `target`: objects merge key by key, `null` deletes
/// the key, anything else replaces it. Objects left empty by the merge are
/// removed.
pub fn recursive_update(target: &mut JsonObject, new: &JsonObject) {
    for (key, value) in new {
        match value {
            serde_json::Value::Object(inner) => {
                let slot = target
                    .entry(key.clone())
                    .or_insert_with(|| serde_json::Value::Object(JsonObject::new()));
                if !slot.is_object() {
                    *slot = serde_json::Value::Object(JsonObject::new());
                }
                let emptied = match slot {
                    serde_json::Value::Object(existing) => {
                        recursive_update(existing, inner);
                        existing.is_empty()
                    }
                    _ => false,
                };
                if emptied {
                    target.shift_remove(key);
                }
            }
            serde_json::Value::Null => {
                target.shift_remove(key);
            }
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
}

/// Reads and writes per-section JSON settings in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonConfigManager {
    config_dir: PathBuf,
    read_directory: bool,
}

impl JsonConfigManager {
    /// A manager over `config_dir` that reads drop-in fragments.
    #[must_use]
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            read_directory: true,
        }
    }

    /// A manager over the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::NoConfigDir`] when the platform has none.
    pub fn default_location() -> Result<Self, ManagerError> {
        defaults::config_dir()
            .map(Self::new)
            .ok_or(ManagerError::NoConfigDir)
    }

    /// Whether `get` reads `<section>.d/` fragments.
    #[must_use]
    pub const fn read_directory(mut self, read: bool) -> Self {
        self.read_directory = read;
        self
    }

    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the main file of `section`.
    #[must_use]
    pub fn file_name(&self, section: &str) -> PathBuf {
        self.config_dir.join(format!("{section}.{JSON_EXTENSION}"))
    }

    /// Path of the drop-in directory of `section`.
    #[must_use]
    pub fn directory(&self, section: &str) -> PathBuf {
        self.config_dir.join(format!("{section}{DROP_IN_SUFFIX}"))
    }

    /// Reads `section`: drop-in fragments in file name order, then the
    /// main file. Missing files contribute nothing.
    ///
    /// # Errors
    ///
    /// Fails when a file exists but cannot be read or parsed.
    pub fn get(&self, section: &str) -> Result<JsonObject, ManagerError> {
        let mut paths = Vec::new();
        if self.read_directory {
            paths.extend(self.fragments(section)?);
        }
        paths.push(self.file_name(section));

        let mut data = JsonObject::new();
        for path in paths.iter().filter(|p| p.is_file()) {
            recursive_update(&mut data, &read_object(path)?);
        }
        Ok(data)
    }

    /// Replaces the main file of `section` with `data`, creating the
    /// directory when needed.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn set(&self, section: &str, data: &JsonObject) -> Result<(), ManagerError> {
        let path = self.file_name(section);
        let content = serde_json::to_string_pretty(data).map_err(ManagerError::Serialize)?;
        write_atomic(&path, &content).map_err(|source| ManagerError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Reads `section`, applies `data` with [`recursive_update`], writes
    /// the result to the main file and returns it.
    ///
    /// The written file also carries whatever the fragments contributed.
    ///
    /// # Errors
    ///
    /// Fails when reading or writing fails.
    pub fn update(&self, section: &str, data: &JsonObject) -> Result<JsonObject, ManagerError> {
        let mut current = self.get(section)?;
        recursive_update(&mut current, data);
        self.set(section, &current)?;
        Ok(current)
    }

    fn fragments(&self, section: &str) -> Result<Vec<PathBuf>, ManagerError> {
        let dir = self.directory(section);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&dir).map_err(|source| ManagerError::Read {
            path: dir.clone(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == JSON_EXTENSION))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

fn read_object(path: &Path) -> Result<JsonObject, ManagerError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManagerError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_json::from_str(&content) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(ManagerError::NotAnObject {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ManagerError::Parse {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
