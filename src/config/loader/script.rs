//! The config script dialect.
//!
//! One statement per line:
//!
//! ```text
//! # comment
//! c = get_config()
//! load_subconfig('base.py')
//! c.Section.key = 10
//! c.Section.items.append('x')
//! c.Section.items.insert(0, 'y')
//! c.Section.mapping.update({'a': 1})
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::config::error::ConfigError;
use crate::config::literal::parse_literal;
use crate::config::tree::{Config, ConfigItem};
use crate::value::Value;

use super::{FileConfigLoader, FileLocation, cached_regex, find_file};

static ASSIGNMENT: OnceLock<Regex> = OnceLock::new();
static METHOD: OnceLock<Regex> = OnceLock::new();
static SUBCONFIG: OnceLock<Regex> = OnceLock::new();

const ASSIGNMENT_PATTERN: &str = r"^c((?:\.[A-Za-z_]\w*)+)\s*=\s*(.+)$";
const METHOD_PATTERN: &str =
    r"^c((?:\.[A-Za-z_]\w*)+)\.(append|extend|prepend|insert|update|add)\((.*)\)$";
const SUBCONFIG_PATTERN: &str = r"^load_subconfig\((.+)\)$";

/// Loads a config script.
#[derive(Debug, Clone)]
pub struct ScriptFileLoader {
    location: FileLocation,
}

impl ScriptFileLoader {
    /// An empty `search_path` means the current directory.
    #[must_use]
    pub fn new(filename: impl Into<String>, search_path: Vec<PathBuf>) -> Self {
        Self {
            location: FileLocation::new(filename, search_path),
        }
    }

    /// Runs the script text as if read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Script`] naming the failing line.
    pub fn load_str(&self, path: &Path, text: &str) -> Result<Config, ConfigError> {
        let mut config = Config::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.execute(path, &mut config, line)
                .map_err(|message| ConfigError::Script {
                    path: path.to_path_buf(),
                    line: index + 1,
                    message,
                })?;
        }
        Ok(config)
    }

    fn execute(&self, path: &Path, config: &mut Config, line: &str) -> Result<(), String> {
        if matches!(line, "c = get_config()" | "c=get_config()") {
            return Ok(());
        }
        if let Some(caps) = compiled(&SUBCONFIG, SUBCONFIG_PATTERN)?.captures(line) {
            let name = literal(&caps[1])?;
            let name = name
                .as_str()
                .ok_or_else(|| format!("load_subconfig expects a file name, got {name}"))?;
            return self.load_subconfig(path, config, name);
        }
        if let Some(caps) = compiled(&METHOD, METHOD_PATTERN)?.captures(line) {
            return call_method(config, &caps[1][1..], &caps[2], &caps[3]);
        }
        if let Some(caps) = compiled(&ASSIGNMENT, ASSIGNMENT_PATTERN)?.captures(line) {
            let value = literal(&caps[2])?;
            return config.set_path(&caps[1][1..], value).map_err(|e| e.to_string());
        }
        Err(format!("unsupported statement: {line}"))
    }

    /// Merges another script in at lower priority. The script's own
    /// directory is searched first. A missing file is ignored.
    fn load_subconfig(&self, path: &Path, config: &mut Config, name: &str) -> Result<(), String> {
        let mut search_path: Vec<PathBuf> = path.parent().map(Path::to_path_buf).into_iter().collect();
        search_path.extend(self.location.search_path().iter().cloned());
        let Ok(found) = find_file(name, &search_path) else {
            tracing::debug!(subconfig = name, "Subconfig not found, ignoring");
            return Ok(());
        };
        let sub = Self::new(found.to_string_lossy(), Vec::new())
            .load_config()
            .map_err(|e| e.to_string())?;
        config.merge(&sub);
        Ok(())
    }
}

impl FileConfigLoader for ScriptFileLoader {
    fn location(&self) -> &FileLocation {
        &self.location
    }

    fn load_config(&self) -> Result<Config, ConfigError> {
        let path = self.location.find()?;
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::FileRead {
            path: path.clone(),
            source,
        })?;
        let config = self.load_str(&path, &text)?;
        tracing::debug!(path = %path.display(), sections = config.len(), "Config script loaded");
        Ok(config)
    }
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> Result<&'static Regex, String> {
    cached_regex(cell, pattern).map_err(|e| e.to_string())
}

fn literal(text: &str) -> Result<Value, String> {
    parse_literal(text).map_err(|e| format!("invalid literal {text:?}: {e}"))
}

/// Runs `c.<path>.<method>(<args>)`. A concrete list or set already
/// stored at the path is edited in place; otherwise the edit is recorded
/// lazily.
fn call_method(config: &mut Config, path: &str, method: &str, args: &str) -> Result<(), String> {
    let (sections, key) = path.rsplit_once('.').unwrap_or(("", path));
    let mut section = config;
    for part in sections.split('.').filter(|p| !p.is_empty()) {
        section = section.section_mut(part).map_err(|e| e.to_string())?;
    }
    let args = if method == "insert" {
        let pair = literal(&format!("({args},)"))?;
        match pair.to_items().as_deref() {
            Some([Value::Int(index), value]) => Arguments::Insert(*index, value.clone()),
            _ => return Err("insert expects an integer index and a value".to_owned()),
        }
    } else {
        Arguments::One(literal(args)?)
    };

    if let Some(ConfigItem::Value(current)) = section.get_mut(key) {
        return edit_concrete(current, method, args);
    }
    let lazy = section.lazy_mut(key).map_err(|e| e.to_string())?;
    match (method, args) {
        ("append", Arguments::One(value)) => lazy.append(value),
        ("extend", Arguments::One(value)) => lazy.extend(sequence(&value)?),
        ("prepend", Arguments::One(value)) => lazy.prepend(sequence(&value)?),
        ("insert", Arguments::Insert(index, value)) => lazy.insert(index, value),
        ("update", Arguments::One(value)) => lazy.update(&value).map_err(|e| e.to_string())?,
        ("add", Arguments::One(value)) => lazy.add(value).map_err(|e| e.to_string())?,
        _ => return Err(format!("unsupported method {method}")),
    }
    Ok(())
}

enum Arguments {
    One(Value),
    Insert(i64, Value),
}

fn sequence(value: &Value) -> Result<Vec<Value>, String> {
    value
        .to_items()
        .ok_or_else(|| format!("expected a sequence, got {}", value.type_name()))
}

fn edit_concrete(current: &mut Value, method: &str, args: Arguments) -> Result<(), String> {
    match (current, method, args) {
        (Value::List(items), "append", Arguments::One(value)) => items.push(value),
        (Value::List(items), "extend", Arguments::One(value)) => items.extend(sequence(&value)?),
        (Value::List(items), "insert", Arguments::Insert(index, value)) => {
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let at = if index < 0 { (len + index).max(0) } else { index.min(len) };
            items.insert(usize::try_from(at).unwrap_or(items.len()), value);
        }
        (Value::Dict(map), "update", Arguments::One(Value::Dict(other))) => map.extend(other),
        (Value::Set(set), "add", Arguments::One(value)) => {
            set.insert(value);
        }
        (Value::Set(set), "update", Arguments::One(value)) => set.extend(sequence(&value)?),
        (current, _, _) => {
            return Err(format!("'{}' object has no method {method}", current.type_name()));
        }
    }
    Ok(())
}
