//! Read access to the job server database.
//!
//! Uses rusqlite (SQLite) with a thread-safe `Database` handle.
//! All access is serialized through a `Mutex<Connection>`, held for one
//! query at a time.

use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;
use rusqlite::{Connection, OpenFlags};

pub mod error;
pub mod job_repo;
pub mod job_request_repo;
pub mod job_store;

pub use error::DatabaseError;
pub use job_store::DatabaseJobStore;

/// Names of the tables holding jobs and job requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub job: String,
    pub job_request: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            job: "jobserver_job".to_string(),
            job_request: "jobserver_jobrequest".to_string(),
        }
    }
}

impl TableNames {
    /// Rejects names that cannot be interpolated into SQL verbatim.
    pub fn validate(&self) -> Result<(), DatabaseError> {
        for name in [&self.job, &self.job_request] {
            if !is_valid_identifier(name) {
                return Err(DatabaseError::InvalidIdentifier(name.clone()));
            }
        }
        Ok(())
    }
}

/// Returns true for plain SQL identifiers (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_valid_identifier(name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
        .is_match(name)
}

/// Thread-safe database handle wrapping a single rusqlite connection.
///
/// Cloning is cheap (inner `Arc`).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens an existing database read-only.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if !path.exists() {
            return Err(DatabaseError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "database not found"),
            });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        log::info!("Database opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a writable in-memory database, for seeding in tests.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}
