//! `SQLite`-backed key-value store.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{migrations, KeyValueStore};
use crate::error::{Error, Result};

const MEMORY_PATH: &str = ":memory:";

/// Durable key-value store kept in a single `SQLite` table.
///
/// The connection is shared behind a mutex and every call runs on tokio's
/// blocking pool, so the async callers never stall the runtime on disk I/O.
/// Cloning the store yields another handle to the same connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening key-value store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Key-value store opened at {}", path.display());
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store, lost when the last handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(MEMORY_PATH),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List all stored keys in lexical order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn keys(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
            let keys = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(keys)
        })
        .await
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn stats(&self) -> Result<StoreStats> {
        let path = self.path.clone();
        self.with_conn(move |conn| {
            let (total_keys, total_value_bytes): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM kv",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let last_write: Option<String> = conn
                .query_row(
                    "SELECT updated_at FROM kv ORDER BY updated_at DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            let last_write = last_write
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc));

            let db_size_bytes = if path.as_os_str() == MEMORY_PATH {
                0
            } else {
                match std::fs::metadata(&path) {
                    Ok(meta) => meta.len(),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
                    Err(e) => return Err(e.into()),
                }
            };

            Ok(StoreStats {
                total_keys,
                total_value_bytes,
                last_write,
                db_size_bytes,
            })
        })
        .await
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| Error::internal("key-value connection mutex poisoned"))?;
            f(&guard)
        })
        .await?
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let value = conn
                .query_row("SELECT value FROM kv WHERE key = ?1", [&key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                r"
                INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                ",
                params![key, value, Utc::now().to_rfc3339()],
            )?;
            debug!("Wrote {} bytes to {}", value.len(), key);
            Ok(())
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let affected = conn.execute("DELETE FROM kv WHERE key = ?1", [&key])?;
            debug!("Removed {} ({} row(s))", key, affected);
            Ok(())
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

/// Statistics about the key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of keys stored.
    pub total_keys: i64,
    /// Combined size of all values in bytes.
    pub total_value_bytes: i64,
    /// When any key was last written.
    pub last_write: Option<DateTime<Utc>>,
    /// Size of the database file in bytes (0 for in-memory stores).
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test store")
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = create_test_store();
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = create_test_store();
        store.set("greeting", "bonjour").await.unwrap();
        assert_eq!(
            store.get("greeting").await.unwrap(),
            Some("bonjour".to_string())
        );
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = create_test_store();
        store.set("k", "one").await.unwrap();
        store.set("k", "two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("two".to_string()));
        assert_eq!(store.keys().await.unwrap(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = create_test_store();
        store.set("k", "v").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let store = create_test_store();
        assert!(store.remove("never-written").await.is_ok());
    }

    #[tokio::test]
    async fn test_keys_sorted() {
        let store = create_test_store();
        store.set("b", "2").await.unwrap();
        store.set("a", "1").await.unwrap();
        assert_eq!(
            store.keys().await.unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unicode_value() {
        let store = create_test_store();
        store.set("note", "Passage à niveau ⚠").await.unwrap();
        assert_eq!(
            store.get("note").await.unwrap().as_deref(),
            Some("Passage à niveau ⚠")
        );
    }

    #[tokio::test]
    async fn test_stats() {
        let store = create_test_store();
        let empty = store.stats().await.unwrap();
        assert_eq!(empty.total_keys, 0);
        assert_eq!(empty.total_value_bytes, 0);
        assert!(empty.last_write.is_none());
        assert_eq!(empty.db_size_bytes, 0);

        store.set("a", "abc").await.unwrap();
        store.set("b", "é").await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_keys, 2);
        assert_eq!(stats.total_value_bytes, 5);
        assert!(stats.last_write.is_some());
    }

    #[tokio::test]
    async fn test_clones_share_connection() {
        let store = create_test_store();
        let other = store.clone();
        store.set("shared", "yes").await.unwrap();
        assert_eq!(other.get("shared").await.unwrap().as_deref(), Some("yes"));
    }

    #[tokio::test]
    async fn test_open_file_based_persists() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("store.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            assert_eq!(store.path(), db_path);
            store.set("k", "durable").await.unwrap();
        }

        let reopened = SqliteStore::open(&db_path).unwrap();
        assert_eq!(
            reopened.get("k").await.unwrap().as_deref(),
            Some("durable")
        );
        assert!(reopened.stats().await.unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_backend_name() {
        assert_eq!(create_test_store().backend_name(), "sqlite");
    }
}
