//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading the job server database.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database file could not be opened.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A job references a job request that does not exist.
    #[error("Job request {0} not found")]
    JobRequestNotFound(i64),

    /// A configured table name is not a plain SQL identifier.
    #[error("Invalid table name '{0}'")]
    InvalidIdentifier(String),

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,
}
