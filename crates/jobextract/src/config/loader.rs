use std::path::Path;

use crate::config::schema::Config;
use crate::db::is_valid_identifier;
use crate::error::ConfigError;

/// Loads a YAML (or JSON) config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    // An empty document deserializes as null; treat it as all defaults.
    let config: Config = if content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(content)?
    };

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let markers = &config.markers;
    if markers.fan_out.is_empty() || markers.error.is_empty() {
        return Err(ConfigError::Validation {
            message: "Action markers must not be empty".to_string(),
        });
    }
    if markers.fan_out == markers.error {
        return Err(ConfigError::Validation {
            message: format!(
                "Fan-out and error markers must differ (both are '{}')",
                markers.fan_out
            ),
        });
    }

    if config.batch_size == 0 {
        return Err(ConfigError::Validation {
            message: "batch_size must be greater than zero".to_string(),
        });
    }

    for name in [&config.tables.job, &config.tables.job_request] {
        if !is_valid_identifier(name) {
            return Err(ConfigError::Validation {
                message: format!("Invalid table name '{}'", name),
            });
        }
    }

    Ok(())
}
