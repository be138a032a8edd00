//! `--Section.key=value` command lines.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::config::error::ConfigError;
use crate::config::literal::parse_config_value;
use crate::config::tree::Config;
use crate::deprecation;
use crate::value::{Value, ValueMap};

use super::cached_regex;

static KV: OnceLock<Regex> = OnceLock::new();
static FLAG: OnceLock<Regex> = OnceLock::new();

/// `--foo=a`, `--Class.trait=value`, `--alias-name=value`.
const KV_PATTERN: &str = r"^--[A-Za-z][\w\-]*(\.[\w\-]+)*=";

/// `--foo`, `-foo-bar`. No `=` and no dots.
const FLAG_PATTERN: &str = r"^--?\w+[\-\w]*$";

/// A named partial config applied when its flag is given.
#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    pub config: Config,
    pub help: String,
}

impl Flag {
    #[must_use]
    pub fn new(config: Config, help: impl Into<String>) -> Self {
        Self {
            config,
            help: help.into(),
        }
    }
}

/// The outcome of parsing a command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedArgs {
    pub config: Config,
    /// Arguments that were not options, in order, plus everything after `--`.
    pub extra_args: Vec<String>,
}

/// Parses `--Section.key=value` assignments and flags.
///
/// # Example
///
/// ```
/// use traitconf::config::KeyValueConfigLoader;
///
/// let loaded = KeyValueConfigLoader::new()
///     .load_config(&["--A.name='brian'", "--B.number=0"])
///     .unwrap();
/// assert!(loaded.config.contains("A.name"));
/// assert!(loaded.config.contains("B.number"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyValueConfigLoader {
    aliases: IndexMap<String, String>,
    flags: IndexMap<String, Flag>,
}

impl KeyValueConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `--name=value` stand for `--target=value`.
    #[must_use]
    pub fn alias(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(name.into(), target.into());
        self
    }

    /// Registers `--name` to apply `config`.
    #[must_use]
    pub fn flag(mut self, name: impl Into<String>, config: Config, help: impl Into<String>) -> Self {
        self.flags.insert(name.into(), Flag::new(config, help));
        self
    }

    #[must_use]
    pub const fn aliases(&self) -> &IndexMap<String, String> {
        &self.aliases
    }

    #[must_use]
    pub const fn flags(&self) -> &IndexMap<String, Flag> {
        &self.flags
    }

    /// Parses `argv`, which excludes the program name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Argument`] for unknown flags, malformed
    /// option-like tokens, and assignments that cannot be stored.
    pub fn load_config<S: AsRef<str>>(&self, argv: &[S]) -> Result<LoadedArgs, ConfigError> {
        let kv = cached_regex(&KV, KV_PATTERN)?;
        let flag = cached_regex(&FLAG, FLAG_PATTERN)?;
        let mut loaded = LoadedArgs::default();

        for (index, raw) in argv.iter().map(AsRef::as_ref).enumerate() {
            if raw == "--" {
                loaded
                    .extra_args
                    .extend(argv[index + 1..].iter().map(|a| a.as_ref().to_owned()));
                break;
            }

            let item = raw.trim_start_matches('-');
            if item.is_empty() {
                // a lone '-' (stdin) or a run of dashes
                loaded.extra_args.push(raw.to_owned());
                continue;
            }

            if kv.is_match(raw) {
                let (lhs, rhs) = item.split_once('=').unwrap_or((item, ""));
                let lhs = self.aliases.get(lhs).map_or(lhs, String::as_str);
                if !lhs.contains('.') {
                    tracing::warn!("Unrecognized alias: '{raw}', it will probably have no effect.");
                }
                exec_config_str(&mut loaded.config, lhs, Rhs::Single(rhs.to_owned()))
                    .map_err(|_| ConfigError::argument(format!("Invalid argument: '{raw}'")))?;
            } else if flag.is_match(raw) {
                let Some(found) = self.flags.get(item) else {
                    return Err(ConfigError::argument(format!("Unrecognized flag: '{raw}'")));
                };
                loaded.config.update_sections(&found.config)?;
            } else if raw.starts_with('-') {
                let suggestion = format!("--{item}");
                return Err(if kv.is_match(&suggestion) {
                    ConfigError::argument(format!(
                        "Invalid argument: '{raw}', did you mean '{suggestion}'?"
                    ))
                } else {
                    ConfigError::argument(format!("Invalid argument: '{raw}'"))
                });
            } else {
                loaded.extra_args.push(item.to_owned());
            }
        }
        tracing::debug!(
            sections = loaded.config.len(),
            extra = loaded.extra_args.len(),
            "Command line parsed"
        );
        Ok(loaded)
    }
}

/// Right-hand side of a command-line assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Rhs {
    /// `--Section.key=value`
    Single(String),
    /// Values given to a container option.
    Items(Vec<String>),
    /// Values given to a dict option.
    Dict(Vec<DictItem>),
}

/// One value given to a dict option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum DictItem {
    /// A whole `{...}` literal.
    Literal(String),
    /// `key=value`
    Pair(String, String),
}

fn is_bracketed(text: &str) -> bool {
    (text.starts_with('[') && text.ends_with(']')) || (text.starts_with('(') && text.ends_with(')'))
}

/// Stores `rhs` at the dotted path `lhs`, parsing each value with
/// [`parse_config_value`].
pub(super) fn exec_config_str(config: &mut Config, lhs: &str, rhs: Rhs) -> Result<(), ConfigError> {
    let value = match rhs {
        Rhs::Single(text) => parse_config_value(&text),
        Rhs::Items(items) => match items.as_slice() {
            [only] if only.len() > 1 && is_bracketed(only) => {
                if deprecation::should_warn(&format!("container:{lhs}")) {
                    tracing::warn!(
                        "--{lhs}={only} for containers is deprecated. \
                         You can pass --{lhs} item ... multiple times to add items to a list."
                    );
                }
                parse_config_value(only)
            }
            _ => Value::List(items.iter().map(|item| parse_config_value(item)).collect()),
        },
        Rhs::Dict(items) => match items.as_slice() {
            [DictItem::Literal(only)] => {
                if deprecation::should_warn(&format!("dict:{lhs}")) {
                    tracing::warn!(
                        "--{lhs}={only} for dict-traits is deprecated. \
                         You can pass --{lhs} <key=value> ... multiple times to add items to a dict."
                    );
                }
                parse_config_value(only)
            }
            _ => {
                let mut map = ValueMap::new();
                for item in items {
                    let DictItem::Pair(key, value) = item else {
                        return Err(ConfigError::argument(format!(
                            "Expecting <key>=<value> for Dict-trait '{lhs}'"
                        )));
                    };
                    map.insert(Value::Str(key), parse_config_value(&value));
                }
                Value::Dict(map)
            }
        },
    };
    config.set_path(lhs, value)
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
