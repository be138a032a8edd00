//! CLI argument parsing using clap.
//!
//! Defines the command-line interface of the `traitconf` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// traitconf: layered configuration inspector
///
/// Loads JSON and script config files plus `--Section.key=value`
/// arguments, merges them, and prints the result.
#[derive(Debug, Parser)]
#[command(name = "traitconf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for traitconf
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge config files and command-line assignments, then print the result
    Show {
        /// Config file to load; later files take priority (can be specified multiple times)
        #[arg(long = "config-file", short = 'f', value_name = "PATH")]
        config_files: Vec<PathBuf>,

        /// Print as a versioned JSON document
        #[arg(long)]
        json: bool,

        /// Assignments such as --Section.key=value, given after `--`
        #[arg(last = true, value_name = "ARGS")]
        args: Vec<String>,
    },

    /// Report keys that two config files set to different values
    Collisions {
        /// The file whose values are kept
        first: PathBuf,

        /// The file whose values are ignored
        second: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Parses CLI arguments from an iterator, returning clap's error
    /// instead of exiting.
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from_iter<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(iter)
    }
}
