use std::path::PathBuf;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::pipeline::CommandError;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Malformed run command for action '{action_id}' of job {job_id}: {source}")]
    MalformedCommand {
        job_id: i64,
        action_id: String,
        #[source]
        source: CommandError,
    },

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to create output file '{path}': {source}")]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

pub type Result<T> = std::result::Result<T, ExtractError>;
