//! `convoisentinel` - field notebook for exceptional convoy escorts
//!
//! This library keeps the list of road obstacles reported along a convoy
//! route, the user's light/dark theme preference and the emergency contact
//! directory, all on top of a small asynchronous key-value store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod app;
pub mod cli;
pub mod config;
pub mod contacts;
pub mod error;
pub mod logging;
pub mod obstacle;
pub mod storage;
pub mod theme;

pub use app::{App, Backend, Status};
pub use config::Config;
pub use contacts::Contact;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use obstacle::{NewObstacle, Obstacle, ObstacleForm, ObstacleStore};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StoreStats};
pub use theme::{
    AppearanceSource, ColorScheme, HostAppearance, ThemePreference, ThemeResolver, ThemeState,
};
