//! [`JobStore`] over the job server's SQLite database.

use std::collections::VecDeque;

use tracing::debug;

use super::{job_repo, job_request_repo, Database, DatabaseError, TableNames};
use crate::store::{JobRow, JobRows, JobStore, PipelineSource};

pub const DEFAULT_BATCH_SIZE: u32 = 1000;

/// Reads jobs in keyset-paginated batches so the full result set is never
/// held in memory.
#[derive(Clone)]
pub struct DatabaseJobStore {
    db: Database,
    tables: TableNames,
    batch_size: u32,
}

impl DatabaseJobStore {
    pub fn new(db: Database, tables: TableNames, batch_size: u32) -> Result<Self, DatabaseError> {
        tables.validate()?;
        Ok(Self {
            db,
            tables,
            batch_size: batch_size.max(1),
        })
    }

    /// Uses the default job server table names and batch size.
    pub fn with_defaults(db: Database) -> Self {
        Self {
            db,
            tables: TableNames::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl JobStore for DatabaseJobStore {
    fn fetch_job_rows(&self) -> JobRows<'_> {
        Box::new(JobRowPages {
            store: self,
            after_id: i64::MIN,
            buffer: VecDeque::new(),
            exhausted: false,
        })
    }

    fn fetch_pipeline_text(&self, job_request_id: i64) -> Result<PipelineSource, DatabaseError> {
        job_request_repo::find_pipeline(&self.db, &self.tables, job_request_id)
    }
}

struct JobRowPages<'a> {
    store: &'a DatabaseJobStore,
    after_id: i64,
    buffer: VecDeque<JobRow>,
    exhausted: bool,
}

impl Iterator for JobRowPages<'_> {
    type Item = Result<JobRow, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = match job_repo::fetch_page(
                &self.store.db,
                &self.store.tables,
                self.after_id,
                self.store.batch_size,
            ) {
                Ok(page) => page,
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            };

            debug!(after_id = self.after_id, rows = page.len(), "Fetched job page");

            if page.len() < self.store.batch_size as usize {
                self.exhausted = true;
            }
            if let Some(last) = page.last() {
                self.after_id = last.job_id;
            }
            self.buffer.extend(page);
        }

        self.buffer.pop_front().map(Ok)
    }
}
