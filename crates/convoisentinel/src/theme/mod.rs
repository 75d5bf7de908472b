//! Light/dark theme preference.
//!
//! The user picks a [`ThemePreference`]; the [`ColorScheme`] actually applied
//! is derived from it and, for [`ThemePreference::System`], from the host
//! appearance. [`ThemeResolver`] owns that state for the lifetime of the app.

mod appearance;
mod resolver;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub use appearance::{AppearanceSource, HostAppearance};
pub use resolver::{ThemeResolver, ThemeState};

/// The user's stored theme choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    /// Always light.
    Light,
    /// Always dark.
    Dark,
    /// Follow the host appearance.
    #[default]
    System,
}

impl ThemePreference {
    /// The literal stored for this preference.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = Error;

    /// Only the exact literals `light`, `dark` and `system` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(Error::UnknownPreference(other.to_string())),
        }
    }
}

/// The appearance actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Light appearance ("Jour").
    #[default]
    Light,
    /// Dark appearance ("Nuit").
    Dark,
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

/// Resolve the effective scheme for a preference and the host appearance.
#[must_use]
pub fn resolve(preference: ThemePreference, host: ColorScheme) -> ColorScheme {
    match preference {
        ThemePreference::Light => ColorScheme::Light,
        ThemePreference::Dark => ColorScheme::Dark,
        ThemePreference::System => host,
    }
}
