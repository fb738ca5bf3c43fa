//! Normalized output records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::JobRow;

/// One job execution, as written to the jobs output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: i64,
    pub status: String,
    pub status_code: String,
    pub status_message: String,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub identifier: String,
    pub job_request_id: i64,
    pub workspace_id: i64,
}

impl Job {
    /// Projects the `job_*` columns of a store row onto a job.
    pub fn from_row(row: &JobRow) -> Self {
        Self {
            id: row.job_id,
            status: row.job_status.clone(),
            status_code: row.job_status_code.clone(),
            status_message: row.job_status_message.clone(),
            created_at: row.job_created_at,
            started_at: row.job_started_at,
            updated_at: row.job_updated_at,
            completed_at: row.job_completed_at,
            identifier: row.job_identifier.clone(),
            job_request_id: row.job_job_request_id,
            workspace_id: row.job_workspace_id,
        }
    }
}

/// A (job, pipeline action) pairing with the tool the action invokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    /// The pipeline action that was matched.
    pub id: String,
    /// The reference the job carried: the action id or a marker.
    pub pseudo_id: String,
    pub job_id: i64,
    #[serde(rename = "type")]
    pub tool_type: String,
    #[serde(rename = "version")]
    pub tool_version: String,
}

/// A job flattened together with the action it names, if that action could
/// be found in its pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub id: i64,
    pub status: String,
    pub status_code: String,
    pub status_message: String,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub identifier: String,
    pub job_request_id: i64,
    pub workspace_id: i64,
    pub action_id: String,
    pub action_type: Option<String>,
    pub action_version: Option<String>,
}

impl JobSummary {
    pub fn new(job: Job, action_id: String, action: Option<Action>) -> Self {
        let (action_type, action_version) = match action {
            Some(action) => (Some(action.tool_type), Some(action.tool_version)),
            None => (None, None),
        };

        Self {
            id: job.id,
            status: job.status,
            status_code: job.status_code,
            status_message: job.status_message,
            created_at: job.created_at,
            started_at: job.started_at,
            updated_at: job.updated_at,
            completed_at: job.completed_at,
            identifier: job.identifier,
            job_request_id: job.job_request_id,
            workspace_id: job.workspace_id,
            action_id,
            action_type,
            action_version,
        }
    }
}

/// Marker strings a job row may carry instead of a concrete action id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMarkers {
    /// Resolves to every action in the pipeline.
    pub fan_out: String,
    /// The job failed before any action ran.
    pub error: String,
}

impl Default for ActionMarkers {
    fn default() -> Self {
        Self {
            fan_out: "run_all".to_string(),
            error: "__error__".to_string(),
        }
    }
}

/// A job's action reference, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoActionId {
    Concrete(String),
    FanOut(String),
    Error(String),
}

impl PseudoActionId {
    pub fn classify(raw: &str, markers: &ActionMarkers) -> Self {
        if raw == markers.error {
            PseudoActionId::Error(raw.to_string())
        } else if raw == markers.fan_out {
            PseudoActionId::FanOut(raw.to_string())
        } else {
            PseudoActionId::Concrete(raw.to_string())
        }
    }

    /// The raw reference as stored on the job.
    pub fn as_str(&self) -> &str {
        match self {
            PseudoActionId::Concrete(s) | PseudoActionId::FanOut(s) | PseudoActionId::Error(s) => s,
        }
    }
}

impl std::fmt::Display for PseudoActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
