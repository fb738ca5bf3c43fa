//! Job repository: reads jobs joined with their job requests.

use rusqlite::{params, Row};

use super::{Database, DatabaseError, TableNames};
use crate::store::JobRow;

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            job_id: row.get("job_id")?,
            job_status: row.get("job_status")?,
            job_status_code: row.get("job_status_code")?,
            job_status_message: row.get("job_status_message")?,
            job_created_at: row.get("job_created_at")?,
            job_started_at: row.get("job_started_at")?,
            job_updated_at: row.get("job_updated_at")?,
            job_completed_at: row.get("job_completed_at")?,
            job_identifier: row.get("job_identifier")?,
            job_job_request_id: row.get("job_job_request_id")?,
            job_workspace_id: row.get("job_workspace_id")?,
            pseudo_action_id: row.get("pseudo_action_id")?,
        })
    }
}

fn page_sql(tables: &TableNames) -> String {
    format!(
        "SELECT
            job.id AS job_id,
            job.status AS job_status,
            job.status_code AS job_status_code,
            job.status_message AS job_status_message,
            job.created_at AS job_created_at,
            job.started_at AS job_started_at,
            job.updated_at AS job_updated_at,
            job.completed_at AS job_completed_at,
            job.identifier AS job_identifier,
            job.job_request_id AS job_job_request_id,
            jobrequest.workspace_id AS job_workspace_id,
            job.action AS pseudo_action_id
         FROM {job} AS job
         JOIN {job_request} AS jobrequest ON job.job_request_id = jobrequest.id
         WHERE job.id > ?1
         ORDER BY job.id
         LIMIT ?2",
        job = tables.job,
        job_request = tables.job_request,
    )
}

/// Fetches up to `limit` rows with a job id greater than `after_id`, in
/// ascending id order.
pub fn fetch_page(
    db: &Database,
    tables: &TableNames,
    after_id: i64,
    limit: u32,
) -> Result<Vec<JobRow>, DatabaseError> {
    let sql = page_sql(tables);
    db.with_conn(|conn| {
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map(params![after_id, limit], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
