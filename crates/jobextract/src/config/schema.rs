use serde::Deserialize;

use crate::db::job_store::DEFAULT_BATCH_SIZE;
use crate::db::TableNames;
use crate::records::ActionMarkers;
use crate::resolve::MalformedCommandPolicy;

/// Run configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub markers: MarkersConfig,

    #[serde(default)]
    pub malformed_commands: MalformedCommandPolicy,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default)]
    pub tables: TablesConfig,
}

fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            markers: MarkersConfig::default(),
            malformed_commands: MalformedCommandPolicy::default(),
            batch_size: default_batch_size(),
            tables: TablesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkersConfig {
    #[serde(default = "default_fan_out")]
    pub fan_out: String,
    #[serde(default = "default_error")]
    pub error: String,
}

fn default_fan_out() -> String {
    ActionMarkers::default().fan_out
}

fn default_error() -> String {
    ActionMarkers::default().error
}

impl Default for MarkersConfig {
    fn default() -> Self {
        Self {
            fan_out: default_fan_out(),
            error: default_error(),
        }
    }
}

impl From<&MarkersConfig> for ActionMarkers {
    fn from(config: &MarkersConfig) -> Self {
        ActionMarkers {
            fan_out: config.fan_out.clone(),
            error: config.error.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TablesConfig {
    #[serde(default = "default_job_table")]
    pub job: String,
    #[serde(default = "default_job_request_table")]
    pub job_request: String,
}

fn default_job_table() -> String {
    TableNames::default().job
}

fn default_job_request_table() -> String {
    TableNames::default().job_request
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            job: default_job_table(),
            job_request: default_job_request_table(),
        }
    }
}

impl From<&TablesConfig> for TableNames {
    fn from(config: &TablesConfig) -> Self {
        TableNames {
            job: config.job.clone(),
            job_request: config.job_request.clone(),
        }
    }
}
