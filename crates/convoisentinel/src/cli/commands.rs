//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::obstacle::ObstacleForm;
use crate::theme::{ColorScheme, ThemePreference};

/// Obstacle commands.
#[derive(Debug, Subcommand)]
pub enum ObstacleCommand {
    /// List reported obstacles, most recent first
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Report a new obstacle
    Add(AddObstacleArgs),

    /// Show a single obstacle
    Show {
        /// Obstacle id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Remove an obstacle
    Remove {
        /// Obstacle id
        id: String,
    },

    /// Remove every obstacle
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments of `obstacle add`.
#[derive(Debug, Args)]
pub struct AddObstacleArgs {
    /// Short title, e.g. "Pont bas"
    #[arg(short, long, default_value = "")]
    pub title: String,

    /// Free-form description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Latitude in decimal degrees (comma accepted)
    #[arg(long = "lat", default_value = "", allow_hyphen_values = true)]
    pub latitude: String,

    /// Longitude in decimal degrees (comma accepted)
    #[arg(long = "lon", default_value = "", allow_hyphen_values = true)]
    pub longitude: String,

    /// Reference to a photo of the obstacle
    #[arg(long = "photo")]
    pub photo_uri: Option<String>,
}

impl From<AddObstacleArgs> for ObstacleForm {
    fn from(args: AddObstacleArgs) -> Self {
        Self {
            title: args.title,
            description: args.description,
            latitude: args.latitude,
            longitude: args.longitude,
            photo_uri: args.photo_uri,
        }
    }
}

/// Theme commands.
#[derive(Debug, Subcommand)]
pub enum ThemeCommand {
    /// Show the theme preference and the applied scheme
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Change the theme preference
    Set {
        /// New preference
        #[arg(value_enum)]
        preference: ThemeArg,
    },
}

/// Contacts command arguments.
#[derive(Debug, Args)]
pub struct ContactsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Theme preference argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    /// Always light
    Light,
    /// Always dark
    Dark,
    /// Follow the host appearance
    System,
}

impl From<ThemeArg> for ThemePreference {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
            ThemeArg::System => Self::System,
        }
    }
}

/// Host appearance argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppearanceArg {
    /// Light host
    Light,
    /// Dark host
    Dark,
}

impl From<AppearanceArg> for ColorScheme {
    fn from(arg: AppearanceArg) -> Self {
        match arg {
            AppearanceArg::Light => Self::Light,
            AppearanceArg::Dark => Self::Dark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_arg_conversion() {
        assert_eq!(ThemePreference::from(ThemeArg::Light), ThemePreference::Light);
        assert_eq!(ThemePreference::from(ThemeArg::Dark), ThemePreference::Dark);
        assert_eq!(
            ThemePreference::from(ThemeArg::System),
            ThemePreference::System
        );
    }

    #[test]
    fn test_appearance_arg_conversion() {
        assert_eq!(ColorScheme::from(AppearanceArg::Light), ColorScheme::Light);
        assert_eq!(ColorScheme::from(AppearanceArg::Dark), ColorScheme::Dark);
    }

    #[test]
    fn test_add_args_into_form() {
        let args = AddObstacleArgs {
            title: "Pont bas".to_string(),
            description: "3,5 m".to_string(),
            latitude: "48,85".to_string(),
            longitude: String::new(),
            photo_uri: None,
        };
        let form = ObstacleForm::from(args);
        assert_eq!(form.title, "Pont bas");
        assert_eq!(form.latitude, "48,85");

        let fields = form.validate().unwrap();
        assert_eq!(fields.latitude, Some(48.85));
        assert_eq!(fields.longitude, None);
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
