//! Versioned JSON config files.
//!
//! ```json
//! {"version": 1, "Section": {"key": "value"}}
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::defaults::JSON_VERSION;
use crate::config::error::ConfigError;
use crate::config::tree::Config;

use super::{FileConfigLoader, FileLocation, write_atomic};

/// On-disk layout: the version key followed by one object per section.
#[derive(Debug, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<serde_json::Value>,
    #[serde(flatten)]
    sections: serde_json::Map<String, serde_json::Value>,
}

/// Reads and writes a JSON config file.
#[derive(Debug, Clone)]
pub struct JsonFileConfigLoader {
    location: FileLocation,
}

impl JsonFileConfigLoader {
    /// An empty `search_path` means the current directory.
    #[must_use]
    pub fn new(filename: impl Into<String>, search_path: Vec<PathBuf>) -> Self {
        Self {
            location: FileLocation::new(filename, search_path),
        }
    }

    /// Writes `config` with the version key added, pretty-printed. An
    /// existing file is replaced atomically.
    ///
    /// # Errors
    ///
    /// Fails when a value has no JSON form or the file cannot be written.
    pub fn save(&self, config: &Config) -> Result<PathBuf, ConfigError> {
        let document = Document {
            version: Some(JSON_VERSION.into()),
            sections: config.to_json()?,
        };
        let path = self.location.target();
        let content = serde_json::to_string_pretty(&document)
            .map_err(|source| ConfigError::JsonParse {
                path: path.clone(),
                source,
            })?;
        write_atomic(&path, &content).map_err(|source| ConfigError::FileWrite {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "JSON config saved");
        Ok(path)
    }

    /// Loads the file (an empty config when missing), lets `edit` change
    /// it, and writes it back. Nothing is written when `edit` fails.
    ///
    /// # Errors
    ///
    /// Returns `edit`'s error, or a load or save failure.
    pub fn edit<E>(&self, edit: impl FnOnce(&mut Config) -> Result<(), E>) -> Result<Config, E>
    where
        E: From<ConfigError>,
    {
        let mut config = match self.load_config() {
            Ok(config) => config,
            Err(e) if e.is_not_found() => Config::new(),
            Err(e) => return Err(e.into()),
        };
        edit(&mut config)?;
        self.save(&config)?;
        Ok(config)
    }
}

impl FileConfigLoader for JsonFileConfigLoader {
    fn location(&self) -> &FileLocation {
        &self.location
    }

    fn load_config(&self) -> Result<Config, ConfigError> {
        let path = self.location.find()?;
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::FileRead {
            path: path.clone(),
            source,
        })?;
        let json: serde_json::Value =
            serde_json::from_str(&content).map_err(|source| ConfigError::JsonParse {
                path: path.clone(),
                source,
            })?;
        if !json.is_object() {
            return Err(ConfigError::JsonShape {
                path,
                reason: "top level must be an object".to_owned(),
            });
        }
        let document: Document =
            serde_json::from_value(json).map_err(|e| ConfigError::JsonShape {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        match document.version {
            None => {}
            Some(version) if version.as_i64() == Some(JSON_VERSION) => {}
            Some(version) => {
                return Err(ConfigError::UnsupportedVersion {
                    path,
                    version: version.to_string(),
                });
            }
        }
        let config = Config::from_json(&document.sections).map_err(|e| match e {
            ConfigError::SectionValue { key, .. } => ConfigError::JsonShape {
                path: path.clone(),
                reason: format!("section '{key}' must be an object"),
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), sections = config.len(), "JSON config loaded");
        Ok(config)
    }
}
