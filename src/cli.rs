//! Command-line interface definitions and parsing
//!
//! This module defines the complete CLI structure for paramcache using the
//! `clap` crate.
//!
//! # Commands
//!
//! - **tree**: Show the parameter tree (default)
//! - **get** / **set** / **add**: Read, update and create parameters
//! - **rm** / **rmdir**: Delete a parameter or a whole folder
//! - **search**: Ranked search over names, paths and values
//! - **status**: Result of the load cycle
//! - **config**: Read and change configuration
//!
//! # Examples
//!
//! ```
//! use clap::Parser;
//! use paramcache::cli::{Cli, Commands};
//!
//! let cli = Cli::parse_from(["paramcache", "get", "/app/db/host"]);
//! assert!(matches!(cli.get_command(), Commands::Get { .. }));
//! ```

use crate::tree::ParameterType;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Configuration management subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set {
        /// Configuration key=value (e.g., sync.page_size=20)
        #[arg(value_name = "KEY=VALUE")]
        setting: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key to retrieve (e.g., store)
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Print the configuration file path
    Path,
}

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "paramcache")]
#[command(about = "Browse and edit a hierarchical parameter store", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Log more (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Store file to use instead of the configured one
    #[arg(long = "store", value_name = "PATH", global = true)]
    pub store: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the parameter tree (default)
    #[command(visible_alias = "ls")]
    Tree {
        /// Folder to start from
        #[arg(value_name = "PATH")]
        path: Option<String>,

        /// Levels to show below the start
        #[arg(short = 'd', long = "depth")]
        depth: Option<usize>,
    },

    /// Print a parameter's value
    Get {
        #[arg(value_name = "PATH")]
        path: String,

        /// Print the whole node as JSON
        #[arg(long = "json")]
        json: bool,

        /// Show secure string values
        #[arg(long = "reveal")]
        reveal: bool,
    },

    /// Change a parameter's value and save it
    Set {
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(value_name = "VALUE")]
        value: String,
    },

    /// Create a parameter
    Add {
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(value_name = "VALUE")]
        value: String,

        /// Parameter type: string, stringlist or securestring
        #[arg(short = 't', long = "type", default_value = "string")]
        param_type: ParameterType,
    },

    /// Delete a parameter
    #[command(visible_alias = "del")]
    Rm {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Delete a folder and every parameter below it
    Rmdir {
        #[arg(value_name = "PATH")]
        path: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },

    /// Search names, paths and values
    #[command(visible_alias = "s")]
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        /// Print hits as JSON
        #[arg(long = "json")]
        json: bool,

        /// Show at most this many hits
        #[arg(short = 'n', long = "limit")]
        limit: Option<usize>,
    },

    /// Show the result of the load cycle
    Status {
        /// Print the status as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the command, defaulting to Tree if none specified
    #[must_use]
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Tree {
            path: None,
            depth: None,
        })
    }

    /// Log filter for the requested verbosity, `None` to defer to `RUST_LOG`
    #[must_use]
    pub const fn log_directive(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("paramcache=debug"),
            _ => Some("paramcache=trace"),
        }
    }
}
