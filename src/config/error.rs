//! Error types for config trees, files and command lines.

use std::path::PathBuf;

use thiserror::Error;

use crate::trait_types::TraitError;
use crate::value::NotJsonSerializable;

use super::literal::LiteralError;

/// Error type for configuration operations.
///
/// Covers config tree misuse, file discovery and parsing, the script
/// dialect, and command-line grammar.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No file with this name exists in any searched directory.
    #[error("Config file '{name}' not found in {}", display_dirs(searched))]
    FileNotFound {
        /// File name as given
        name: String,
        /// Directories searched, in order
        searched: Vec<PathBuf>,
    },

    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the configuration file.
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("Failed to parse JSON config '{}': {source}", path.display())]
    JsonParse {
        /// Path to the config file
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// The JSON document is not an object, or a section is not an object.
    #[error("Invalid JSON config '{}': {reason}", path.display())]
    JsonShape {
        /// Path to the config file
        path: PathBuf,
        /// What was wrong
        reason: String,
    },

    /// The JSON file declares a `version` this loader cannot read.
    #[error("Unknown version of JSON config file '{}': {version}", path.display())]
    UnsupportedVersion {
        /// Path to the config file
        path: PathBuf,
        /// The declared version
        version: String,
    },

    /// A statement in a config script failed to parse or execute.
    #[error("{}:{line}: {message}", path.display())]
    Script {
        /// Path to the script
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Text is not a valid literal.
    #[error("Invalid literal {text:?}: {source}")]
    Literal {
        /// The text that failed to parse
        text: String,
        /// Where and why parsing stopped
        #[source]
        source: LiteralError,
    },

    /// A section key was given something other than a section, or a
    /// section was expected under a non-section key.
    #[error("values whose keys begin with an uppercase char must be Config instances: '{key}', {value}")]
    SectionValue {
        /// The offending key
        key: String,
        /// Rendering of the offending value
        value: String,
    },

    /// A lazy container operation does not apply to the value.
    #[error("{0}")]
    Invalid(String),

    /// Malformed command-line input.
    #[error("{0}")]
    Argument(String),

    /// A value was rejected while applying config to an object.
    #[error(transparent)]
    Trait(#[from] TraitError),

    /// A value has no JSON form.
    #[error(transparent)]
    NotJson(#[from] NotJsonSerializable),
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    if dirs.is_empty() {
        return "the current directory".to_owned();
    }
    dirs.iter()
        .map(|d| format!("'{}'", d.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConfigError {
    /// Creates a command-line grammar error.
    #[must_use]
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    /// Creates a section-value error.
    #[must_use]
    pub fn section_value(key: impl Into<String>, value: impl ToString) -> Self {
        Self::SectionValue {
            key: key.into(),
            value: value.to_string(),
        }
    }

    /// True for a missing file, which some callers treat as an empty
    /// config.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }
}
