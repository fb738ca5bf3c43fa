//! Extraction sessions: streaming jobs and their resolved actions.
//!
//! A session owns the store, the pipeline cache and the resolver. Each call
//! to [`ExtractionSession::extract`] re-reads the store from the start; the
//! cache persists for the lifetime of the session.

use std::sync::Arc;

use tracing::{debug_span, info};

use crate::config::Config;
use crate::diagnostics::{DiagnosticSink, TracingDiagnostics};
use crate::error::ExtractError;
use crate::records::{ActionMarkers, Job, JobSummary, PseudoActionId};
use crate::resolve::{
    ActionResolver, MalformedCommandPolicy, PipelineCache, PipelineOutcome, ResolvedActions,
};
use crate::store::{JobRow, JobRows, JobStore};

/// Runtime options for a session.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub markers: ActionMarkers,
    pub malformed_commands: MalformedCommandPolicy,
}

impl ExtractOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            markers: (&config.markers).into(),
            malformed_commands: config.malformed_commands,
        }
    }
}

pub struct ExtractionSession<S: JobStore> {
    store: S,
    cache: PipelineCache,
    resolver: ActionResolver,
    diagnostics: Arc<dyn DiagnosticSink>,
    markers: ActionMarkers,
}

impl<S: JobStore> ExtractionSession<S> {
    /// Creates a session that reports diagnostics through `tracing`.
    pub fn new(store: S, options: ExtractOptions) -> Self {
        Self::with_diagnostics(store, options, Arc::new(TracingDiagnostics))
    }

    pub fn with_diagnostics(
        store: S,
        options: ExtractOptions,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            store,
            cache: PipelineCache::new(),
            resolver: ActionResolver::new(options.malformed_commands, Arc::clone(&diagnostics)),
            diagnostics,
            markers: options.markers,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &PipelineCache {
        &self.cache
    }

    /// Streams one `(Job, actions)` pair per store row, in store order.
    ///
    /// The stream stops after the first error.
    pub fn extract(&mut self) -> JobsActions<'_, S> {
        let (rows, ctx) = self.split();
        JobsActions {
            rows,
            ctx,
            jobs: 0,
            done: false,
        }
    }

    /// Streams one [`JobSummary`] per store row, in store order.
    pub fn extract_job_summaries(&mut self) -> JobSummaries<'_, S> {
        let (rows, ctx) = self.split();
        JobSummaries {
            rows,
            ctx,
            jobs: 0,
            done: false,
        }
    }

    fn split(&mut self) -> (JobRows<'_>, RowContext<'_, S>) {
        let Self {
            store,
            cache,
            resolver,
            diagnostics,
            markers,
        } = self;
        let store: &S = store;

        let ctx = RowContext {
            store,
            cache,
            resolver,
            diagnostics: &**diagnostics,
            markers,
        };
        (store.fetch_job_rows(), ctx)
    }
}

/// Borrowed session state needed to process one row.
struct RowContext<'s, S> {
    store: &'s S,
    cache: &'s mut PipelineCache,
    resolver: &'s ActionResolver,
    diagnostics: &'s dyn DiagnosticSink,
    markers: &'s ActionMarkers,
}

impl<S: JobStore> RowContext<'_, S> {
    fn load(&mut self, row: &JobRow) -> Result<(Job, PipelineOutcome), ExtractError> {
        let job = Job::from_row(row);
        let outcome =
            self.cache
                .resolve_pipeline(job.job_request_id, self.store, self.diagnostics)?;
        Ok((job, outcome))
    }
}

/// Stream of jobs paired with their resolved actions.
pub struct JobsActions<'s, S: JobStore> {
    rows: JobRows<'s>,
    ctx: RowContext<'s, S>,
    jobs: u64,
    done: bool,
}

impl<S: JobStore> Iterator for JobsActions<'_, S> {
    type Item = Result<(Job, ResolvedActions), ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let row = match self.rows.next() {
            Some(Ok(row)) => row,
            Some(Err(e)) => {
                self.done = true;
                return Some(Err(e.into()));
            }
            None => {
                self.done = true;
                info!(jobs = self.jobs, "Finished reading jobs");
                return None;
            }
        };

        let _span = debug_span!("job", job_id = row.job_id).entered();
        match self.ctx.load(&row) {
            Ok((job, outcome)) => {
                let pseudo = PseudoActionId::classify(&row.pseudo_action_id, self.ctx.markers);
                let actions = self.ctx.resolver.resolve(&outcome, &pseudo, job.id);
                self.jobs += 1;
                Some(Ok((job, actions)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Stream of one-row-per-job summaries.
pub struct JobSummaries<'s, S: JobStore> {
    rows: JobRows<'s>,
    ctx: RowContext<'s, S>,
    jobs: u64,
    done: bool,
}

impl<S: JobStore> JobSummaries<'_, S> {
    fn summarize(&mut self, row: JobRow) -> Result<JobSummary, ExtractError> {
        let (job, outcome) = self.ctx.load(&row)?;
        let action = match PseudoActionId::classify(&row.pseudo_action_id, self.ctx.markers) {
            PseudoActionId::Concrete(id) => self.ctx.resolver.resolve_named(&outcome, &id, job.id)?,
            PseudoActionId::FanOut(_) | PseudoActionId::Error(_) => None,
        };
        Ok(JobSummary::new(job, row.pseudo_action_id, action))
    }
}

impl<S: JobStore> Iterator for JobSummaries<'_, S> {
    type Item = Result<JobSummary, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let row = match self.rows.next() {
            Some(Ok(row)) => row,
            Some(Err(e)) => {
                self.done = true;
                return Some(Err(e.into()));
            }
            None => {
                self.done = true;
                info!(jobs = self.jobs, "Finished reading jobs");
                return None;
            }
        };

        let _span = debug_span!("job", job_id = row.job_id).entered();
        let summary = self.summarize(row);
        match summary {
            Ok(_) => self.jobs += 1,
            Err(_) => self.done = true,
        }
        Some(summary)
    }
}
