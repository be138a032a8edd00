//! Configuration layer.
//!
//! This module provides:
//! - The config tree ([`Config`], [`ConfigItem`]) and deferred container
//!   edits ([`LazyValue`])
//! - File loaders for versioned JSON and the script dialect
//!   ([`JsonFileConfigLoader`], [`ScriptFileLoader`])
//! - Command-line loaders ([`KeyValueConfigLoader`], [`ArgParseConfigLoader`])
//! - A JSON settings store with drop-in fragments ([`JsonConfigManager`])
//! - CLI argument parsing for the binary ([`Cli`], [`Command`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! [`Config::merge`] keeps the values already present, so a config is
//! built from the highest-priority source down:
//!
//! ```text
//! let mut config = command_line;
//! config.merge(&user_file);
//! config.merge(&system_file);
//! ```
//!
//! A [`LazyValue`] is the exception: its edits are applied on top of the
//! value being merged in, so `c.App.paths.append('x')` extends a list set
//! by a lower-priority file instead of replacing it.
//!
//! # Sections
//!
//! Keys starting with an uppercase letter name sections and always hold a
//! nested [`Config`], normally one per class. Applying a config to an
//! object reads the sections named after its class and bases; see
//! [`HasTraits::apply_config`](crate::has_traits::HasTraits::apply_config).

mod cli;
pub mod defaults;
mod error;
mod lazy;
pub mod literal;
pub mod loader;
mod manager;
mod tree;

#[cfg(test)]
mod cli_tests;

pub use cli::{Cli, Command};
pub use error::ConfigError;
pub use lazy::LazyValue;
pub use literal::{parse_config_value, parse_literal};
pub use loader::{
    ArgParseConfigLoader, FileConfigLoader, FileLocation, Flag, JsonFileConfigLoader,
    KeyValueConfigLoader, LoadedArgs, ScriptFileLoader, find_file, load_config_files, load_file,
};
pub use manager::{JsonConfigManager, JsonObject, ManagerError, recursive_update};
pub use tree::{Collision, Collisions, Config, ConfigItem};
