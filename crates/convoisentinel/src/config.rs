//! Configuration management for convoisentinel.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashSet;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::contacts::{default_contacts, is_valid_phone, Contact};
use crate::error::{Error, Result};
use crate::obstacle::DEFAULT_TITLE;
use crate::storage::{OBSTACLES_KEY, THEME_KEY};
use crate::theme::ColorScheme;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "convoisentinel";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "store.db";

/// Prefix of environment variable overrides. Nested keys use `__`, e.g.
/// `CONVOISENTINEL_STORAGE__DATABASE_PATH`.
const ENV_PREFIX: &str = "CONVOISENTINEL_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CONVOISENTINEL_`)
/// 2. TOML config file at `~/.config/convoisentinel/config.toml`
/// 3. Default values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Obstacle defaults.
    pub obstacles: ObstacleConfig,
    /// Theme configuration.
    pub theme: ThemeConfig,
    /// Emergency contacts directory.
    pub contacts: Vec<Contact>,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/convoisentinel/store.db`
    pub database_path: Option<PathBuf>,
    /// Key holding the obstacle list.
    pub obstacles_key: String,
    /// Key holding the theme preference.
    pub theme_key: String,
}

/// Obstacle-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Title given to obstacles submitted without one.
    pub default_title: String,
}

/// Theme-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Appearance reported for the host when the preference is `system`.
    pub host_appearance: ColorScheme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            obstacles: ObstacleConfig::default(),
            theme: ThemeConfig::default(),
            contacts: default_contacts(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Resolved to the data directory at runtime
            obstacles_key: OBSTACLES_KEY.to_string(),
            theme_key: THEME_KEY.to_string(),
        }
    }
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(Error::ConfigValidation { message });

        if self.storage.obstacles_key.trim().is_empty() {
            return invalid("storage.obstacles_key must not be empty".to_string());
        }
        if self.storage.theme_key.trim().is_empty() {
            return invalid("storage.theme_key must not be empty".to_string());
        }
        if self.storage.obstacles_key == self.storage.theme_key {
            return invalid(format!(
                "storage.obstacles_key and storage.theme_key must differ (both are '{}')",
                self.storage.obstacles_key
            ));
        }

        if self.obstacles.default_title.trim().is_empty() {
            return invalid("obstacles.default_title must not be blank".to_string());
        }

        let mut ids = HashSet::new();
        for contact in &self.contacts {
            if !ids.insert(contact.id.as_str()) {
                return invalid(format!("duplicate contact id '{}'", contact.id));
            }
            if let Some(phone) = &contact.phone {
                if !is_valid_phone(phone) {
                    return invalid(format!(
                        "contact '{}' has an invalid phone number: {phone}",
                        contact.name
                    ));
                }
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
