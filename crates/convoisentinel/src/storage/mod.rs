//! Key-value persistence for convoisentinel.
//!
//! Everything the application keeps on disk lives under a handful of string
//! keys holding string values. This module defines the [`KeyValueStore`]
//! abstraction and its two implementations:
//!
//! - [`SqliteStore`]: durable storage in a single `SQLite` table
//! - [`MemoryStore`]: ephemeral storage for tests and throwaway sessions

mod memory;
pub mod migrations;
pub mod schema;
mod sqlite;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreStats};

/// Key under which the obstacle list is stored.
pub const OBSTACLES_KEY: &str = "@convoisentinel:obstacles";

/// Key under which the theme preference is stored.
pub const THEME_KEY: &str = "@convoisentinel:theme";

/// An asynchronous string-keyed store of string values.
///
/// Implementations must treat each call as a complete unit: a `set` either
/// replaces the whole value or fails, and never leaves a partial write.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`, or `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage rejects the write.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage rejects the delete.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Short name of the backend, for logs and status output.
    fn backend_name(&self) -> &'static str;
}
