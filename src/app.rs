//! Application startup and utilities.
//!
//! Exit codes, logging to stderr and hints for fixable config errors.

use traitconf::config::ConfigError;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Application exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// Success (exit code 0).
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Configuration error (exit code 1) - unreadable or malformed files, bad arguments.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Runtime error (exit code 2) - output could not be produced.
    ///
    /// Note: This is a function rather than a constant because `ExitCode::from()` is not `const fn`.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// Returns a one-line suggestion for errors a user can fix by hand.
const fn config_hint(error: &ConfigError) -> Option<&'static str> {
    match error {
        ConfigError::FileNotFound { .. } => Some("Check the paths passed with --config-file."),
        ConfigError::Argument(_) => {
            Some("Assignments look like '--Section.key=value' and follow '--'.")
        }
        ConfigError::Script { .. } => {
            Some("Script statements look like 'c.Section.key = value', one per line.")
        }
        ConfigError::Literal { .. } => {
            Some("Quote string values in scripts, e.g. c.App.name = 'text'.")
        }
        ConfigError::JsonShape { .. } | ConfigError::SectionValue { .. } => {
            Some("Top-level keys name sections and must hold objects, e.g. {\"App\": {\"key\": 1}}.")
        }
        ConfigError::UnsupportedVersion { .. } => {
            Some("Only version 1 JSON config files are supported.")
        }
        _ => None,
    }
}

/// Prints a hint for `error`, if one applies.
pub fn print_config_hint(error: &ConfigError) {
    if let Some(hint) = config_hint(error) {
        eprintln!("\n{hint}");
    }
}

/// Sets up the tracing subscriber. Logs go to stderr so that stdout only
/// carries the printed config.
pub fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
