//! The job store seam: where job rows and pipeline text come from.

use chrono::{DateTime, Utc};

use crate::db::DatabaseError;

/// A raw job row from the job/job-request join.
///
/// Field names follow the query's column labels; [`crate::records::Job::from_row`]
/// maps them onto job attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub job_id: i64,
    pub job_status: String,
    pub job_status_code: String,
    pub job_status_message: String,
    pub job_created_at: Option<DateTime<Utc>>,
    pub job_started_at: Option<DateTime<Utc>>,
    pub job_updated_at: Option<DateTime<Utc>>,
    pub job_completed_at: Option<DateTime<Utc>>,
    pub job_identifier: String,
    pub job_job_request_id: i64,
    pub job_workspace_id: i64,
    /// The job's action column: an action id or a marker.
    pub pseudo_action_id: String,
}

/// Pipeline text stored on a job request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSource {
    /// Raw project definition; `None` when the column is NULL.
    pub text: Option<String>,
    /// Human-readable job request identifier, for diagnostics only.
    pub identifier: String,
}

impl PipelineSource {
    /// Returns the text unless it is NULL or empty.
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// Lazily produced job rows. Finite and single-pass.
pub type JobRows<'a> = Box<dyn Iterator<Item = Result<JobRow, DatabaseError>> + 'a>;

/// Read-only access to the job server's data.
pub trait JobStore {
    /// Streams every job joined with its job request.
    fn fetch_job_rows(&self) -> JobRows<'_>;

    /// Fetches the pipeline text and display identifier of a job request.
    fn fetch_pipeline_text(&self, job_request_id: i64) -> Result<PipelineSource, DatabaseError>;
}

impl<S: JobStore + ?Sized> JobStore for &S {
    fn fetch_job_rows(&self) -> JobRows<'_> {
        (**self).fetch_job_rows()
    }

    fn fetch_pipeline_text(&self, job_request_id: i64) -> Result<PipelineSource, DatabaseError> {
        (**self).fetch_pipeline_text(job_request_id)
    }
}
