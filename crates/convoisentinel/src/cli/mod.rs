//! Command-line interface for convoisentinel.
//!
//! This module provides the CLI structure for the `convoi` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddObstacleArgs, AppearanceArg, ConfigCommand, ContactsCommand, ObstacleCommand,
    StatusCommand, ThemeArg, ThemeCommand,
};

use crate::config::Config;
use crate::logging::Verbosity;

/// convoi - Road hazard notebook for exceptional convoys
///
/// Report obstacles along the route, keep the emergency contacts at hand and
/// pick a day or night theme.
#[derive(Debug, Parser)]
#[command(name = "convoi")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Host appearance used when the theme follows the system
    #[arg(long, value_enum, global = true)]
    pub appearance: Option<AppearanceArg>,

    /// Keep everything in memory for this run only
    #[arg(long, global = true)]
    pub memory: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage reported obstacles
    #[command(subcommand)]
    Obstacle(ObstacleCommand),

    /// Show or change the theme
    #[command(subcommand)]
    Theme(ThemeCommand),

    /// List emergency contacts
    Contacts(ContactsCommand),

    /// Show storage and theme status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// The configuration file this run reads: `-c` when given, the default
    /// location otherwise.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_config_path)
    }
}
