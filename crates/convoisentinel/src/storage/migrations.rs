//! Schema versioning for the `SQLite` key-value store.
//!
//! The schema version lives in the `metadata` table. A fresh database reports
//! version 0 and is brought forward one step at a time.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

const VERSION_KEY: &str = "schema_version";

type Migration = fn(&Connection) -> Result<()>;

/// Ordered migration steps; entry `n` brings the schema from `n` to `n + 1`.
const MIGRATIONS: &[Migration] = &[migrate_v1];

/// Create the tables if needed and apply any pending migrations.
///
/// # Errors
///
/// Returns an error if schema creation or a migration step fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let mut version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    while version < CURRENT_VERSION {
        let step = usize::try_from(version)
            .ok()
            .and_then(|idx| MIGRATIONS.get(idx))
            .ok_or_else(|| Error::DatabaseMigration {
                message: format!("unknown migration version: {}", version + 1),
            })?;
        debug!("Migrating key-value schema to version {}", version + 1);
        step(conn)?;
        version += 1;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

/// Read the schema version, 0 when none has been recorded.
///
/// # Errors
///
/// Returns an error if the metadata table cannot be queried.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(raw) => raw.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {raw}"),
        }),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

/// Version 1 is the base schema created by `SCHEMA_STATEMENTS`.
fn migrate_v1(_conn: &Connection) -> Result<()> {
    Ok(())
}
