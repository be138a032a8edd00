//! Loaders that build a [`Config`] from files and command lines.
//!
//! - [`JsonFileConfigLoader`]: versioned JSON files
//! - [`ScriptFileLoader`]: the `c.Section.key = value` script dialect
//! - [`KeyValueConfigLoader`]: `--Section.key=value` command lines
//! - [`ArgParseConfigLoader`]: command lines declared from classes

mod argparse;
mod json;
mod kv;
mod script;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::defaults;
use super::error::ConfigError;
use super::tree::Config;

pub use argparse::ArgParseConfigLoader;
pub use json::JsonFileConfigLoader;
pub use kv::{Flag, KeyValueConfigLoader, LoadedArgs};
pub use script::ScriptFileLoader;

/// A file name and the directories to search for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    filename: String,
    search_path: Vec<PathBuf>,
}

impl FileLocation {
    /// An empty `search_path` means the current directory.
    #[must_use]
    pub fn new(filename: impl Into<String>, search_path: Vec<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            search_path,
        }
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Resolves the file. See [`find_file`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] when no candidate exists.
    pub fn find(&self) -> Result<PathBuf, ConfigError> {
        find_file(&self.filename, &self.search_path)
    }

    /// Where a new file would be written: the existing file if there is
    /// one, else the name joined to the first search directory.
    #[must_use]
    pub fn target(&self) -> PathBuf {
        self.find().unwrap_or_else(|_| {
            self.search_path
                .first()
                .map_or_else(|| PathBuf::from(&self.filename), |dir| dir.join(&self.filename))
        })
    }
}

/// Finds `name` in the first directory of `dirs` that has it. An absolute
/// name that exists is used as-is; an empty `dirs` searches the current
/// directory.
///
/// # Errors
///
/// Returns [`ConfigError::FileNotFound`] when no candidate is a file.
pub fn find_file(name: &str, dirs: &[PathBuf]) -> Result<PathBuf, ConfigError> {
    let candidate = Path::new(name);
    if candidate.is_absolute() && candidate.is_file() {
        return Ok(candidate.to_path_buf());
    }
    let current = [PathBuf::new()];
    let dirs = if dirs.is_empty() { &current[..] } else { dirs };
    dirs.iter()
        .map(|dir| PathBuf::from(super::literal::expand_user(&dir.join(name).to_string_lossy())))
        .find(|path| path.is_file())
        .ok_or_else(|| ConfigError::FileNotFound {
            name: name.to_owned(),
            searched: dirs.to_vec(),
        })
}

/// A loader reading one config file.
pub trait FileConfigLoader {
    /// The file this loader reads.
    fn location(&self) -> &FileLocation;

    /// Finds, reads and parses the file.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, unreadable or malformed.
    fn load_config(&self) -> Result<Config, ConfigError>;
}

/// Loads a file with the loader its extension calls for: JSON for
/// `.json`, the script dialect otherwise.
///
/// # Errors
///
/// Propagates the loader's error.
pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let name = path.to_string_lossy().into_owned();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(defaults::JSON_EXTENSION));
    if is_json {
        JsonFileConfigLoader::new(name, Vec::new()).load_config()
    } else {
        ScriptFileLoader::new(name, Vec::new()).load_config()
    }
}

/// Loads several script files in turn. Later files take priority; files
/// that do not exist are skipped.
///
/// # Errors
///
/// Fails on the first file that exists but cannot be loaded.
pub fn load_config_files<S: AsRef<str>>(names: &[S], path: &[PathBuf]) -> Result<Config, ConfigError> {
    let mut config = Config::new();
    for name in names {
        let loader = ScriptFileLoader::new(name.as_ref(), path.to_vec());
        match loader.load_config() {
            Ok(mut next) => {
                next.merge(&config);
                config = next;
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(file = name.as_ref(), "Config file not found, skipping");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(config)
}

/// Compiles `pattern` once into `cell`.
pub(crate) fn cached_regex(
    cell: &'static OnceLock<Regex>,
    pattern: &str,
) -> Result<&'static Regex, ConfigError> {
    if let Some(re) = cell.get() {
        return Ok(re);
    }
    let re = Regex::new(pattern)
        .map_err(|e| ConfigError::Invalid(format!("invalid pattern {pattern:?}: {e}")))?;
    Ok(cell.get_or_init(|| re))
}

/// Writes `content` to `{path}.tmp` and renames it over `path`, creating
/// the parent directory first.
pub(crate) fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // state.json -> state.json.tmp, not state.tmp
    let temp_path = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
