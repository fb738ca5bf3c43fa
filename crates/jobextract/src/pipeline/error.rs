//! Pipeline parsing error types.

use thiserror::Error;

/// Reasons a pipeline document could not be loaded.
#[derive(Error, Debug)]
pub enum PipelineParseError {
    #[error("Failed to parse pipeline YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Pipeline schema validation failed: {errors}")]
    Schema { errors: String },

    #[error("Invalid pipeline structure: {0}")]
    Structure(String),

    #[error("Invalid action '{id}': {reason}")]
    InvalidAction { id: String, reason: String },
}

/// Reasons an action's `run` command does not name a tool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("cannot tokenize command '{0}'")]
    Tokenize(String),

    #[error("command is empty")]
    Empty,

    #[error("first token '{0}' is not of the form type:version")]
    MissingVersion(String),
}
