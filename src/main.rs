//! traitconf: layered configuration inspector
//!
//! Entry point for the traitconf application.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use traitconf::config::defaults::{JSON_VERSION, JSON_VERSION_KEY};
use traitconf::config::{Cli, Command, Config, ConfigError, KeyValueConfigLoader, load_file};

mod app;

use app::{exit_code, print_config_hint, setup_tracing};

/// Main entry point.
///
/// Excluded from coverage as it's the thin wrapper around testable components.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();
    setup_tracing(cli.verbose);

    let result = match &cli.command {
        Command::Show {
            config_files,
            json,
            args,
        } => load_layers(config_files, args).and_then(|config| render(&config, *json)),
        Command::Collisions { first, second } => collisions(first, second),
    };

    let text = match result {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            return exit_code::CONFIG_ERROR;
        }
    };

    match writeln!(std::io::stdout().lock(), "{text}") {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            tracing::error!("Failed to write output: {e}");
            exit_code::runtime_error()
        }
    }
}

/// Loads the files in order, later files taking priority, then applies
/// command-line assignments on top.
fn load_layers(files: &[PathBuf], args: &[String]) -> Result<Config, ConfigError> {
    let mut config = Config::new();
    for path in files {
        let mut next = load_file(path)?;
        next.merge(&config);
        config = next;
        tracing::debug!(file = %path.display(), "Config layer loaded");
    }

    let loaded = KeyValueConfigLoader::new().load_config(args)?;
    if !loaded.extra_args.is_empty() {
        tracing::warn!(extra = ?loaded.extra_args, "Ignoring extra arguments");
    }
    let mut merged = loaded.config;
    merged.merge(&config);
    Ok(merged)
}

/// Renders the config as `Section.key = value` lines, or as a versioned
/// JSON document.
fn render(config: &Config, json: bool) -> Result<String, ConfigError> {
    if !json {
        let lines: Vec<String> = config
            .flatten()
            .into_iter()
            .map(|(path, item)| format!("{path} = {item}"))
            .collect();
        return Ok(lines.join("\n"));
    }
    let mut document = serde_json::Map::new();
    document.insert(JSON_VERSION_KEY.to_owned(), JSON_VERSION.into());
    document.extend(config.to_json()?);
    serde_json::to_string_pretty(&serde_json::Value::Object(document))
        .map_err(|e| ConfigError::Invalid(e.to_string()))
}

/// Lists keys set differently by the two files; the first file's values win.
fn collisions(first: &Path, second: &Path) -> Result<String, ConfigError> {
    let kept = load_file(first)?;
    let ignored = load_file(second)?;
    let found = kept.collisions(&ignored);
    if found.is_empty() {
        return Ok("No collisions".to_owned());
    }
    let mut lines = Vec::new();
    for (section, keys) in &found {
        for (key, collision) in keys {
            tracing::warn!("Collision on option {section}.{key}: {collision}");
            lines.push(format!("{section}.{key}: {collision}"));
        }
    }
    Ok(lines.join("\n"))
}
