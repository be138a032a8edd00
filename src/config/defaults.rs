//! Default values and well-known names.
//!
//! Centralized constants to avoid magic strings scattered across the loaders.

use std::path::PathBuf;

/// The only JSON config file version this crate reads and writes.
pub const JSON_VERSION: i64 = 1;

/// Key holding the version in a JSON config file.
pub const JSON_VERSION_KEY: &str = "version";

/// Extension of JSON config files and settings fragments.
pub const JSON_EXTENSION: &str = "json";

/// Directory name used under the platform config directory.
pub const APP_DIR_NAME: &str = "traitconf";

/// Trait metadata key selecting how container options take values.
pub const MULTIPLICITY_KEY: &str = "multiplicity";

/// Multiplicity of container options when the metadata is absent.
pub const MULTIPLICITY: &str = "append";

/// Suffix of the drop-in directory next to a settings file.
pub const DROP_IN_SUFFIX: &str = ".d";

/// Default directory of the JSON settings manager.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}
