//! Error types for convoisentinel.
//!
//! This module defines all error types used throughout the convoisentinel crate,
//! providing detailed context for debugging and user-facing notices.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for convoisentinel operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// The key-value store rejected a write.
    #[error("write to '{key}' rejected: {message}")]
    WriteRejected {
        /// Storage key that was being written.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    /// An obstacle with this id is already stored.
    #[error("obstacle '{id}' already exists")]
    DuplicateObstacle {
        /// The conflicting id.
        id: String,
    },

    /// A blocking storage task did not complete.
    #[error("storage task failed: {0}")]
    StorageTask(#[from] tokio::task::JoinError),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Validation Errors ===
    /// A coordinate could not be parsed as a number.
    #[error("'{input}' is not a number")]
    InvalidNumber {
        /// The offending input text.
        input: String,
    },

    /// Latitude outside of [-90, 90].
    #[error("invalid latitude {value}: enter a latitude between -90 and 90")]
    InvalidLatitude {
        /// The rejected value.
        value: f64,
    },

    /// Longitude outside of [-180, 180].
    #[error("invalid longitude {value}: enter a longitude between -180 and 180")]
    InvalidLongitude {
        /// The rejected value.
        value: f64,
    },

    /// An unrecognized theme preference was supplied.
    #[error("unknown theme preference '{0}' (expected light, dark or system)")]
    UnknownPreference(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for convoisentinel operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a write-rejected error for the given key.
    #[must_use]
    pub fn write_rejected(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteRejected {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_write_rejected_display() {
        let err = Error::write_rejected("@convoisentinel:obstacles", "disk full");
        let msg = err.to_string();
        assert!(msg.contains("@convoisentinel:obstacles"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_coordinate_errors_display() {
        let err = Error::InvalidLatitude { value: 91.0 };
        assert!(err.to_string().contains("between -90 and 90"));

        let err = Error::InvalidLongitude { value: -181.0 };
        assert!(err.to_string().contains("between -180 and 180"));

        let err = Error::InvalidNumber {
            input: "abc".to_string(),
        };
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_duplicate_obstacle_display() {
        let err = Error::DuplicateObstacle {
            id: "1700000000000-abc123".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "obstacle '1700000000000-abc123' already exists"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "obstacles_key must not be empty".to_string(),
        };
        assert!(err.to_string().contains("obstacles_key"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
