//! Per-session memo of parsed pipelines, keyed by job request id.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::db::DatabaseError;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::pipeline::{self, PipelineDocument};
use crate::store::{JobStore, PipelineSource};

/// What a job request's pipeline resolved to.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Present(Arc<PipelineDocument>),
    /// The job request has no pipeline text.
    Absent,
    /// The pipeline text failed to parse.
    Invalid,
}

impl PipelineOutcome {
    pub fn document(&self) -> Option<&Arc<PipelineDocument>> {
        match self {
            PipelineOutcome::Present(doc) => Some(doc),
            PipelineOutcome::Absent | PipelineOutcome::Invalid => None,
        }
    }
}

/// Holds one outcome per job request for the lifetime of a session.
///
/// Entries are never evicted or replaced: each job request is fetched and
/// parsed at most once. Store failures are returned and not cached.
#[derive(Debug, Default)]
pub struct PipelineCache {
    outcomes: HashMap<i64, PipelineOutcome>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached outcome for `job_request_id`, fetching and parsing
    /// its pipeline on first use.
    pub fn resolve_pipeline<S: JobStore + ?Sized>(
        &mut self,
        job_request_id: i64,
        store: &S,
        diagnostics: &dyn DiagnosticSink,
    ) -> Result<PipelineOutcome, DatabaseError> {
        if let Some(outcome) = self.outcomes.get(&job_request_id) {
            return Ok(outcome.clone());
        }

        let source = store.fetch_pipeline_text(job_request_id)?;
        let outcome = load_outcome(job_request_id, &source, diagnostics);
        self.outcomes.insert(job_request_id, outcome.clone());

        Ok(outcome)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

fn load_outcome(
    job_request_id: i64,
    source: &PipelineSource,
    diagnostics: &dyn DiagnosticSink,
) -> PipelineOutcome {
    let Some(text) = source.non_empty_text() else {
        diagnostics.report(DiagnosticEvent::PipelineMissing {
            job_request_id,
            identifier: source.identifier.clone(),
        });
        return PipelineOutcome::Absent;
    };

    match pipeline::parse(text) {
        Ok(doc) => {
            debug!(
                job_request_id,
                actions = doc.len(),
                "Loaded pipeline for job request {}",
                source.identifier
            );
            PipelineOutcome::Present(Arc::new(doc))
        }
        Err(e) => {
            diagnostics.report(DiagnosticEvent::PipelineInvalid {
                job_request_id,
                identifier: source.identifier.clone(),
                error: e.to_string(),
            });
            PipelineOutcome::Invalid
        }
    }
}
