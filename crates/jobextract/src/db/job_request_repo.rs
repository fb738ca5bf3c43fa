//! Job request repository: pipeline text lookups.

use rusqlite::{params, OptionalExtension};

use super::{Database, DatabaseError, TableNames};
use crate::store::PipelineSource;

/// Finds the pipeline text and identifier of a job request.
pub fn find_pipeline(
    db: &Database,
    tables: &TableNames,
    job_request_id: i64,
) -> Result<PipelineSource, DatabaseError> {
    let sql = format!(
        "SELECT project_definition AS pipeline, identifier FROM {} WHERE id = ?1",
        tables.job_request
    );
    let found = db.with_conn(|conn| {
        let mut stmt = conn.prepare_cached(&sql)?;
        let source = stmt
            .query_row(params![job_request_id], |r| {
                Ok(PipelineSource {
                    text: r.get("pipeline")?,
                    identifier: r.get("identifier")?,
                })
            })
            .optional()?;
        Ok(source)
    })?;

    found.ok_or(DatabaseError::JobRequestNotFound(job_request_id))
}
