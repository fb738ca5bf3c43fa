//! Structured diagnostic events raised while resolving pipelines.

use std::sync::Mutex;

/// Conditions that are recovered from but worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// The job request has no pipeline text.
    PipelineMissing { job_request_id: i64, identifier: String },
    /// The job request's pipeline text could not be parsed.
    PipelineInvalid {
        job_request_id: i64,
        identifier: String,
        error: String,
    },
    /// An action's command has no tool identity; the action was skipped.
    MalformedCommand {
        job_id: i64,
        action_id: String,
        error: String,
    },
}

impl std::fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticEvent::PipelineMissing { identifier, .. } => {
                write!(f, "Job request {} is missing a pipeline", identifier)
            }
            DiagnosticEvent::PipelineInvalid { identifier, .. } => {
                write!(f, "Cannot parse pipeline in job request {}", identifier)
            }
            DiagnosticEvent::MalformedCommand {
                job_id, action_id, ..
            } => write!(
                f,
                "Skipping action {} of job {}: malformed run command",
                action_id, job_id
            ),
        }
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn report(&self, event: DiagnosticEvent);
}

/// Forwards diagnostics to `tracing` as warnings.
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        match &event {
            DiagnosticEvent::PipelineMissing { job_request_id, .. } => {
                tracing::warn!(job_request_id, "{}", event);
            }
            DiagnosticEvent::PipelineInvalid {
                job_request_id,
                error,
                ..
            } => {
                tracing::warn!(job_request_id, error = %error, "{}", event);
            }
            DiagnosticEvent::MalformedCommand { job_id, error, .. } => {
                tracing::warn!(job_id, error = %error, "{}", event);
            }
        }
    }
}

/// Drops every event.
pub struct NoopDiagnostics;

impl DiagnosticSink for NoopDiagnostics {
    fn report(&self, _event: DiagnosticEvent) {}
}

/// Keeps every event in memory, in order.
#[derive(Default)]
pub struct CollectingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events reported so far.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
