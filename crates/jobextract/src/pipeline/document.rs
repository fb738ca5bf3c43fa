//! In-memory pipeline document model.

use indexmap::IndexMap;
use serde::Deserialize;

use super::command::{parse_tool_identity, ToolIdentity};
use super::error::CommandError;

/// One named action of a pipeline document.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDefinition {
    pub id: String,
    /// Raw invocation command, e.g. `cohortextractor:0.5.2 generate_cohort`.
    pub run: String,
    pub needs: Vec<String>,
    /// Privacy level -> output name -> path pattern.
    pub outputs: IndexMap<String, IndexMap<String, String>>,
}

impl ActionDefinition {
    /// Extracts the tool type and version from the `run` command.
    pub fn tool_identity(&self) -> Result<ToolIdentity, CommandError> {
        parse_tool_identity(&self.run)
    }
}

/// A parsed pipeline: actions keyed by id, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDocument {
    version: String,
    actions: IndexMap<String, ActionDefinition>,
}

impl PipelineDocument {
    pub(crate) fn new(version: String, actions: IndexMap<String, ActionDefinition>) -> Self {
        Self { version, actions }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Looks up an action by id.
    pub fn action(&self, id: &str) -> Option<&ActionDefinition> {
        self.actions.get(id)
    }

    /// Actions in document order.
    pub fn actions(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.values()
    }

    pub fn action_ids(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Returns the action at `index` in document order.
    pub fn action_at(&self, index: usize) -> Option<&ActionDefinition> {
        self.actions.get_index(index).map(|(_, action)| action)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Wire shape of a pipeline document, as deserialized from YAML.
#[derive(Debug, Deserialize)]
pub(crate) struct RawPipeline {
    pub version: serde_yaml::Value,
    pub actions: IndexMap<String, RawAction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAction {
    pub run: String,
    #[serde(default)]
    pub needs: Vec<String>,
    #[serde(default)]
    pub outputs: IndexMap<String, IndexMap<String, String>>,
}
