//! Application session: one key-value store shared by the obstacle store and
//! the theme resolver.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::obstacle::ObstacleStore;
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};
use crate::theme::{AppearanceSource, HostAppearance, ThemeResolver, ThemeState};

/// Where the session keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// `SQLite` database at the given path.
    Sqlite(PathBuf),
    /// Nothing survives the process.
    Memory,
}

impl Backend {
    /// The backend described by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::Sqlite(config.database_path())
    }
}

/// Snapshot reported by the `status` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    /// Backend name (`sqlite` or `memory`).
    pub backend: &'static str,
    /// Database file, for the `SQLite` backend.
    pub database_path: Option<PathBuf>,
    /// Number of stored obstacles.
    pub obstacle_count: usize,
    /// Theme preference, scheme and readiness.
    pub theme: ThemeState,
    /// Number of keys present in the database.
    pub stored_keys: Option<i64>,
    /// The keys themselves, in lexical order.
    pub keys: Option<Vec<String>>,
    /// Database file size in bytes.
    pub db_size_bytes: Option<u64>,
    /// Most recent write to any key.
    pub last_write: Option<DateTime<Utc>>,
}

/// A running session.
///
/// [`App::start`] opens storage and loads the theme preference; call
/// [`App::shutdown`] when done.
#[derive(Debug)]
pub struct App {
    config: Config,
    sqlite: Option<SqliteStore>,
    host: Arc<HostAppearance>,
    obstacles: ObstacleStore<dyn KeyValueStore>,
    theme: ThemeResolver<dyn KeyValueStore>,
}

impl App {
    /// Open `backend` and initialize the session.
    ///
    /// The host appearance starts at `config.theme.host_appearance`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn start(config: Config, backend: Backend) -> Result<Self> {
        let (kv, sqlite): (Arc<dyn KeyValueStore>, Option<SqliteStore>) = match &backend {
            Backend::Sqlite(path) => {
                let store = SqliteStore::open(path)?;
                (Arc::new(store.clone()), Some(store))
            }
            Backend::Memory => (Arc::new(MemoryStore::new()), None),
        };
        debug!("Using {} storage", kv.backend_name());

        let host = Arc::new(HostAppearance::new(config.theme.host_appearance));
        let appearance = Arc::clone(&host) as Arc<dyn AppearanceSource>;

        let obstacles = ObstacleStore::new(Arc::clone(&kv))
            .with_key(config.storage.obstacles_key.clone())
            .with_default_title(config.obstacles.default_title.clone());
        let theme =
            ThemeResolver::new(kv, appearance).with_key(config.storage.theme_key.clone());
        theme.init().await;

        info!("Session started");
        Ok(Self {
            config,
            sqlite,
            host,
            obstacles,
            theme,
        })
    }

    /// The configuration the session was started with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The obstacle store.
    #[must_use]
    pub fn obstacles(&self) -> &ObstacleStore<dyn KeyValueStore> {
        &self.obstacles
    }

    /// The theme resolver.
    #[must_use]
    pub fn theme(&self) -> &ThemeResolver<dyn KeyValueStore> {
        &self.theme
    }

    /// The host appearance; setting it simulates the OS switching modes.
    #[must_use]
    pub fn host_appearance(&self) -> &HostAppearance {
        &self.host
    }

    /// Gather the current status.
    ///
    /// # Errors
    ///
    /// Returns an error if database statistics cannot be read.
    pub async fn status(&self) -> Result<Status> {
        let mut status = Status {
            backend: "memory",
            database_path: None,
            obstacle_count: self.obstacles.count().await,
            theme: self.theme.state(),
            stored_keys: None,
            keys: None,
            db_size_bytes: None,
            last_write: None,
        };

        if let Some(store) = &self.sqlite {
            let stats = store.stats().await?;
            status.backend = "sqlite";
            status.database_path = Some(store.path().to_path_buf());
            status.stored_keys = Some(stats.total_keys);
            status.keys = Some(store.keys().await?);
            status.db_size_bytes = Some(stats.db_size_bytes);
            status.last_write = stats.last_write;
        }

        Ok(status)
    }

    /// Stop background work.
    pub fn shutdown(&self) {
        self.theme.shutdown();
        debug!("Session closed");
    }
}
