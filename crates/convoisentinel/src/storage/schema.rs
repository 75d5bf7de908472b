//! `SQLite` schema definitions for the key-value store.

/// SQL statement to create the key-value table.
pub const CREATE_KV_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the metadata table holding the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_KV_TABLE, CREATE_METADATA_TABLE];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert_eq!(SCHEMA_STATEMENTS.len(), 2);
        for stmt in SCHEMA_STATEMENTS {
            assert!(stmt.contains("CREATE TABLE IF NOT EXISTS"));
        }
    }

    #[test]
    fn test_kv_table_columns() {
        assert!(CREATE_KV_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_KV_TABLE.contains("value TEXT NOT NULL"));
        assert!(CREATE_KV_TABLE.contains("updated_at"));
    }
}
