//! Test harness for isolated test execution.
//!
//! `TestHarness` creates a job server database in a temporary directory,
//! seeds it through a writable connection, and opens it read-only through
//! `jobextract::Database` the same way the CLI does.

#![allow(dead_code)]

use std::cell::Cell;
use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::{params, Connection};
use tempfile::TempDir;

use jobextract::store::{JobRows, PipelineSource};
use jobextract::{
    CollectingDiagnostics, Database, DatabaseError, DatabaseJobStore, ExtractOptions,
    ExtractionSession, JobStore, TableNames,
};

use super::builders::JobSpec;

const SCHEMA: &str = "
    CREATE TABLE jobserver_jobrequest (
        id INTEGER PRIMARY KEY,
        workspace_id INTEGER NOT NULL,
        identifier TEXT NOT NULL,
        project_definition TEXT
    );
    CREATE TABLE jobserver_job (
        id INTEGER PRIMARY KEY,
        job_request_id INTEGER NOT NULL REFERENCES jobserver_jobrequest(id),
        action TEXT NOT NULL,
        identifier TEXT NOT NULL,
        status TEXT NOT NULL,
        status_code TEXT NOT NULL DEFAULT '',
        status_message TEXT NOT NULL DEFAULT '',
        created_at TEXT,
        started_at TEXT,
        updated_at TEXT,
        completed_at TEXT
    );
";

/// Wraps a store and counts pipeline fetches.
pub struct CountingStore<S> {
    inner: S,
    fetches: Cell<usize>,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fetches: Cell::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl<S: JobStore> JobStore for CountingStore<S> {
    fn fetch_job_rows(&self) -> JobRows<'_> {
        self.inner.fetch_job_rows()
    }

    fn fetch_pipeline_text(&self, job_request_id: i64) -> Result<PipelineSource, DatabaseError> {
        self.fetches.set(self.fetches.get() + 1);
        self.inner.fetch_pipeline_text(job_request_id)
    }
}

/// Test harness backed by a temporary SQLite job server database.
pub struct TestHarness {
    temp_dir: TempDir,
    /// Path to the database file.
    pub db_path: PathBuf,
    conn: Connection,
}

impl TestHarness {
    /// Create a harness with an empty job server schema.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("jobserver.db");

        let conn = Connection::open(&db_path).expect("Failed to create database");
        conn.execute_batch(SCHEMA).expect("Failed to create schema");

        Self {
            temp_dir,
            db_path,
            conn,
        }
    }

    /// Path inside the harness's temp directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn add_job_request(&self, id: i64, identifier: &str, pipeline: Option<&str>) -> &Self {
        self.conn
            .execute(
                "INSERT INTO jobserver_jobrequest (id, workspace_id, identifier, project_definition)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, 100 + id, identifier, pipeline],
            )
            .expect("Failed to insert job request");
        self
    }

    pub fn add_job(&self, job: JobSpec) -> &Self {
        self.conn
            .execute(
                "INSERT INTO jobserver_job (id, job_request_id, action, identifier, status,
                 status_code, status_message, created_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5, '', ?6, ?7)",
                params![
                    job.id,
                    job.job_request_id,
                    job.action,
                    format!("job-{}", job.id),
                    job.status,
                    job.created_at,
                    job.completed_at,
                ],
            )
            .expect("Failed to insert job");
        self
    }

    /// Open the database read-only as a store.
    pub fn store(&self) -> DatabaseJobStore {
        self.store_with_batch_size(1000)
    }

    pub fn store_with_batch_size(&self, batch_size: u32) -> DatabaseJobStore {
        let db = Database::open(&self.db_path).expect("Failed to open database");
        DatabaseJobStore::new(db, TableNames::default(), batch_size).expect("Invalid store")
    }

    /// A session over a fetch-counting store, collecting diagnostics.
    pub fn session(
        &self,
        options: ExtractOptions,
    ) -> (
        ExtractionSession<CountingStore<DatabaseJobStore>>,
        Arc<CollectingDiagnostics>,
    ) {
        let diagnostics = Arc::new(CollectingDiagnostics::new());
        let session = ExtractionSession::with_diagnostics(
            CountingStore::new(self.store()),
            options,
            diagnostics.clone(),
        );
        (session, diagnostics)
    }
}
