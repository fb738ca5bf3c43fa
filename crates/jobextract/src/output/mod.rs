//! CSV output for extracted jobs and actions.
//!
//! Headers are written up front so an extraction with no rows still produces
//! well-formed files.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::{ExtractError, Result};
use crate::extract::{JobSummaries, JobsActions};
use crate::store::JobStore;

pub const JOB_COLUMNS: &[&str] = &[
    "id",
    "status",
    "status_code",
    "status_message",
    "created_at",
    "started_at",
    "updated_at",
    "completed_at",
    "identifier",
    "job_request_id",
    "workspace_id",
];

pub const ACTION_COLUMNS: &[&str] = &["id", "pseudo_id", "job_id", "type", "version"];

pub const JOB_SUMMARY_COLUMNS: &[&str] = &[
    "id",
    "status",
    "status_code",
    "status_message",
    "created_at",
    "started_at",
    "updated_at",
    "completed_at",
    "identifier",
    "job_request_id",
    "workspace_id",
    "action_id",
    "action_type",
    "action_version",
];

/// Counts of rows written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub jobs: u64,
    pub actions: u64,
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| ExtractError::CreateOutput {
        path: path.to_path_buf(),
        source: e,
    })
}

fn csv_writer<W: Write>(inner: W, header: &[&str]) -> Result<csv::Writer<W>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(inner);
    writer.write_record(header)?;
    Ok(writer)
}

fn finish<W: Write>(writer: csv::Writer<W>) -> Result<W> {
    writer
        .into_inner()
        .map_err(|e| ExtractError::Csv(csv::Error::from(e.into_error())))
}

/// Writes jobs and their actions to two CSV streams.
pub struct JobsActionsWriter<W: Write> {
    jobs: csv::Writer<W>,
    actions: csv::Writer<W>,
}

impl JobsActionsWriter<File> {
    pub fn create(jobs_path: &Path, actions_path: &Path) -> Result<Self> {
        Self::new(create_file(jobs_path)?, create_file(actions_path)?)
    }
}

impl<W: Write> JobsActionsWriter<W> {
    pub fn new(jobs: W, actions: W) -> Result<Self> {
        Ok(Self {
            jobs: csv_writer(jobs, JOB_COLUMNS)?,
            actions: csv_writer(actions, ACTION_COLUMNS)?,
        })
    }

    /// Drains `stream`, writing each job followed by its actions.
    ///
    /// Stops at the first error; rows written before it are kept.
    pub fn write_all<S: JobStore>(&mut self, stream: JobsActions<'_, S>) -> Result<WriteSummary> {
        let mut summary = WriteSummary::default();

        for item in stream {
            let (job, actions) = item?;
            self.jobs.serialize(&job)?;
            summary.jobs += 1;

            for action in actions {
                self.actions.serialize(&action?)?;
                summary.actions += 1;
            }
        }

        self.jobs.flush().map_err(csv::Error::from)?;
        self.actions.flush().map_err(csv::Error::from)?;

        info!(
            jobs = summary.jobs,
            actions = summary.actions,
            "Wrote jobs and actions"
        );
        Ok(summary)
    }

    /// Flushes and returns the underlying writers (jobs, actions).
    pub fn into_inner(self) -> Result<(W, W)> {
        Ok((finish(self.jobs)?, finish(self.actions)?))
    }
}

/// Writes one summary row per job to a single CSV stream.
pub struct JobSummaryWriter<W: Write> {
    jobs: csv::Writer<W>,
}

impl JobSummaryWriter<File> {
    pub fn create(path: &Path) -> Result<Self> {
        Self::new(create_file(path)?)
    }
}

impl<W: Write> JobSummaryWriter<W> {
    pub fn new(jobs: W) -> Result<Self> {
        Ok(Self {
            jobs: csv_writer(jobs, JOB_SUMMARY_COLUMNS)?,
        })
    }

    pub fn write_all<S: JobStore>(&mut self, stream: JobSummaries<'_, S>) -> Result<u64> {
        let mut written = 0;
        for summary in stream {
            self.jobs.serialize(&summary?)?;
            written += 1;
        }
        self.jobs.flush().map_err(csv::Error::from)?;

        info!(jobs = written, "Wrote job summaries");
        Ok(written)
    }

    pub fn into_inner(self) -> Result<W> {
        finish(self.jobs)
    }
}
