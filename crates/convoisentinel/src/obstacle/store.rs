//! The obstacle list, persisted as one JSON array under a single key.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{generate_id, NewObstacle, Obstacle, DEFAULT_TITLE};
use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, OBSTACLES_KEY};

/// Ordered obstacle list, most recent first.
///
/// Every mutation reads the whole list, changes it, and writes it back in a
/// single `set`. Mutations are serialized through an internal lock so two
/// overlapping calls on the same store cannot lose each other's changes.
#[derive(Debug)]
pub struct ObstacleStore<S: ?Sized> {
    kv: Arc<S>,
    key: String,
    default_title: String,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore + ?Sized> ObstacleStore<S> {
    /// Create a store over `kv` using the standard key and default title.
    #[must_use]
    pub fn new(kv: Arc<S>) -> Self {
        Self {
            kv,
            key: OBSTACLES_KEY.to_string(),
            default_title: DEFAULT_TITLE.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    /// Use a different storage key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Use a different title for obstacles submitted without one.
    #[must_use]
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// The storage key holding the list.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load every stored obstacle, most recent first.
    ///
    /// Never fails: a missing key, an unreadable store or a value that is not
    /// a JSON array all yield an empty list. Array entries that are not valid
    /// obstacles are skipped. Each such case is logged as a warning.
    pub async fn get_all(&self) -> Vec<Obstacle> {
        let entries = match self.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read obstacles: {}", e);
                return Vec::new();
            }
        };

        let total = entries.len();
        let obstacles: Vec<Obstacle> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(obstacle) => Some(obstacle),
                Err(e) => {
                    warn!("Skipping malformed obstacle record: {}", e);
                    None
                }
            })
            .collect();

        if obstacles.len() < total {
            warn!(
                "Loaded {} of {} stored obstacles",
                obstacles.len(),
                total
            );
        }
        obstacles
    }

    /// Find one obstacle by id.
    pub async fn get(&self, id: &str) -> Option<Obstacle> {
        self.get_all().await.into_iter().find(|o| o.id == id)
    }

    /// Number of stored obstacles.
    pub async fn count(&self) -> usize {
        self.get_all().await.len()
    }

    /// Overwrite the stored list with `list`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save_all(&self, list: &[Obstacle]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let raw = serde_json::to_string(list)?;
        self.write_raw(&raw, list.len()).await
    }

    /// Add a new obstacle at the front of the list and return it.
    ///
    /// Missing `id` and `created_at` are generated. See
    /// [`NewObstacle`] for how the other fields are normalized. Stored
    /// entries this version cannot parse are carried over untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateObstacle`] if a caller-supplied id is already
    /// stored, or the storage error if the read or the write fails. On error
    /// the stored list is unchanged.
    pub async fn add(&self, fields: NewObstacle) -> Result<Obstacle> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await?;
        let caller_id = fields.id.is_some();
        let mut obstacle =
            fields.into_obstacle(Utc::now().timestamp_millis(), &self.default_title);

        while entries.iter().any(|e| entry_id(e) == Some(obstacle.id.as_str())) {
            if caller_id {
                return Err(Error::DuplicateObstacle { id: obstacle.id });
            }
            obstacle.id = generate_id(obstacle.created_at);
        }

        entries.insert(0, serde_json::to_value(&obstacle)?);
        self.write_entries(&entries).await?;

        info!("Added obstacle {} ({})", obstacle.id, obstacle.title);
        Ok(obstacle)
    }

    /// Remove the obstacle with `id`. An unknown id is not an error and
    /// leaves storage untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or the write fails.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await?;
        let before = entries.len();
        entries.retain(|e| entry_id(e) != Some(id));

        if entries.len() == before {
            debug!("No obstacle with id {}, nothing removed", id);
            return Ok(());
        }
        self.write_entries(&entries).await?;
        info!("Removed obstacle {}", id);
        Ok(())
    }

    /// Delete the stored list entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying remove fails.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.kv.remove(&self.key).await?;
        info!("Cleared all obstacles");
        Ok(())
    }

    /// Raw stored entries. A missing key or a value that is not a JSON array
    /// reads as empty; a failed read is an error.
    async fn load(&self) -> Result<Vec<Value>> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => Ok(entries),
            Ok(other) => {
                warn!(
                    "Stored obstacles are not a list (found {}), ignoring",
                    json_kind(&other)
                );
                Ok(Vec::new())
            }
            Err(e) => {
                warn!("Failed to parse stored obstacles: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn write_entries(&self, entries: &[Value]) -> Result<()> {
        let raw = serde_json::to_string(entries)?;
        self.write_raw(&raw, entries.len()).await
    }

    async fn write_raw(&self, raw: &str, len: usize) -> Result<()> {
        if let Err(e) = self.kv.set(&self.key, raw).await {
            warn!("Failed to save obstacles: {}", e);
            return Err(e);
        }
        debug!("Saved {} obstacle(s) to {}", len, self.key);
        Ok(())
    }
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
