//! Matches a job's action reference against its pipeline document.

use std::sync::Arc;

use serde::Deserialize;

use super::cache::PipelineOutcome;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::error::ExtractError;
use crate::pipeline::{ActionDefinition, PipelineDocument};
use crate::records::{Action, PseudoActionId};

/// What to do with a matched action whose `run` command names no tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedCommandPolicy {
    /// Abort the run.
    #[default]
    Fatal,
    /// Report a diagnostic and drop the action.
    Skip,
}

pub struct ActionResolver {
    policy: MalformedCommandPolicy,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ActionResolver {
    pub fn new(policy: MalformedCommandPolicy, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            policy,
            diagnostics,
        }
    }

    /// Lazily resolves the actions a job corresponds to.
    ///
    /// Yields nothing when the pipeline is absent or invalid, when the job
    /// carries the error marker, or when a concrete id is not in the
    /// document. The fan-out marker yields every action in document order.
    pub fn resolve(
        &self,
        outcome: &PipelineOutcome,
        pseudo_action_id: &PseudoActionId,
        job_id: i64,
    ) -> ResolvedActions {
        let document = outcome.document().cloned();

        let selection = match (&document, pseudo_action_id) {
            (None, _) | (_, PseudoActionId::Error(_)) => Selection::Done,
            (Some(_), PseudoActionId::FanOut(_)) => Selection::All { next: 0 },
            (Some(_), PseudoActionId::Concrete(id)) => Selection::One(id.clone()),
        };

        ResolvedActions {
            document,
            selection,
            pseudo_id: pseudo_action_id.as_str().to_string(),
            job_id,
            policy: self.policy,
            diagnostics: Arc::clone(&self.diagnostics),
        }
    }

    /// Resolves a single concrete action id. The id is looked up as-is, so
    /// callers classify markers first.
    pub fn resolve_named(
        &self,
        outcome: &PipelineOutcome,
        action_id: &str,
        job_id: i64,
    ) -> Result<Option<Action>, ExtractError> {
        self.resolve(outcome, &PseudoActionId::Concrete(action_id.to_string()), job_id)
            .next()
            .transpose()
    }
}

enum Selection {
    Done,
    One(String),
    All { next: usize },
}

/// The actions resolved for one job. Finite and single-pass.
pub struct ResolvedActions {
    document: Option<Arc<PipelineDocument>>,
    selection: Selection,
    pseudo_id: String,
    job_id: i64,
    policy: MalformedCommandPolicy,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ResolvedActions {
    fn next_definition<'d>(&mut self, doc: &'d PipelineDocument) -> Option<&'d ActionDefinition> {
        match &mut self.selection {
            Selection::Done => None,
            Selection::One(id) => {
                let found = doc.action(id);
                self.selection = Selection::Done;
                found
            }
            Selection::All { next } => {
                let found = doc.action_at(*next);
                *next += 1;
                if found.is_none() {
                    self.selection = Selection::Done;
                }
                found
            }
        }
    }

    fn to_action(&self, definition: &ActionDefinition) -> Result<Action, ExtractError> {
        let identity =
            definition
                .tool_identity()
                .map_err(|source| ExtractError::MalformedCommand {
                    job_id: self.job_id,
                    action_id: definition.id.clone(),
                    source,
                })?;

        Ok(Action {
            id: definition.id.clone(),
            pseudo_id: self.pseudo_id.clone(),
            job_id: self.job_id,
            tool_type: identity.tool_type,
            tool_version: identity.version,
        })
    }
}

impl Iterator for ResolvedActions {
    type Item = Result<Action, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        let doc = self.document.clone()?;

        loop {
            let definition = self.next_definition(&doc)?;

            match self.to_action(definition) {
                Ok(action) => return Some(Ok(action)),
                Err(ExtractError::MalformedCommand {
                    job_id,
                    action_id,
                    source,
                }) if self.policy == MalformedCommandPolicy::Skip => {
                    self.diagnostics.report(DiagnosticEvent::MalformedCommand {
                        job_id,
                        action_id,
                        error: source.to_string(),
                    });
                }
                Err(e) => {
                    self.selection = Selection::Done;
                    return Some(Err(e));
                }
            }
        }
    }
}
