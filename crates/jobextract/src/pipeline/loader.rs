//! Parses raw pipeline text into a [`PipelineDocument`].

use std::collections::HashSet;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use super::document::{ActionDefinition, PipelineDocument, RawPipeline};
use super::error::PipelineParseError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/pipeline-v1.json");

/// Action ids the job server reserves for its own markers.
///
/// The job server's fan-out marker is fixed, so this stays `run_all` even
/// when a run configures a different `markers.fan_out`.
pub const RESERVED_ACTION_IDS: &[&str] = &["run_all"];

/// Parses pipeline YAML. Pure: no I/O and no logging.
pub fn parse(raw: &str) -> Result<PipelineDocument, PipelineParseError> {
    let yaml_value: serde_yaml::Value = serde_yaml::from_str(raw)?;

    let json_value = serde_json::to_value(&yaml_value)
        .map_err(|e| PipelineParseError::Structure(e.to_string()))?;
    validate_schema(&json_value)?;

    let raw_pipeline: RawPipeline = serde_yaml::from_value(yaml_value)
        .map_err(|e| PipelineParseError::Structure(e.to_string()))?;

    let version = match raw_pipeline.version {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        other => {
            return Err(PipelineParseError::Structure(format!(
                "version must be a string or number, got {:?}",
                other
            )))
        }
    };

    let mut actions = IndexMap::with_capacity(raw_pipeline.actions.len());
    for (id, action) in raw_pipeline.actions {
        actions.insert(
            id.clone(),
            ActionDefinition {
                id,
                run: action.run,
                needs: action.needs,
                outputs: action.outputs,
            },
        );
    }

    validate_actions(&actions)?;

    Ok(PipelineDocument::new(version, actions))
}

fn schema_validator() -> Result<&'static jsonschema::Validator, PipelineParseError> {
    static VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

    let compiled = VALIDATOR.get_or_init(|| {
        let schema: serde_json::Value = serde_json::from_str(SCHEMA_JSON)
            .map_err(|e| format!("Invalid embedded schema JSON: {}", e))?;
        jsonschema::validator_for(&schema)
            .map_err(|e| format!("Failed to compile JSON schema: {}", e))
    });

    compiled
        .as_ref()
        .map_err(|message| PipelineParseError::Schema {
            errors: message.clone(),
        })
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), PipelineParseError> {
    let validator = schema_validator()?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(PipelineParseError::Schema {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn action_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid action id regex"))
}

fn validate_actions(
    actions: &IndexMap<String, ActionDefinition>,
) -> Result<(), PipelineParseError> {
    let ids: HashSet<&str> = actions.keys().map(String::as_str).collect();

    for (id, action) in actions {
        if !action_id_pattern().is_match(id) {
            return Err(PipelineParseError::InvalidAction {
                id: id.clone(),
                reason: "action ids may only contain letters, digits, '_' and '-'".to_string(),
            });
        }

        if RESERVED_ACTION_IDS.contains(&id.as_str()) {
            return Err(PipelineParseError::InvalidAction {
                id: id.clone(),
                reason: "action id is reserved".to_string(),
            });
        }

        for need in &action.needs {
            if need == id {
                return Err(PipelineParseError::InvalidAction {
                    id: id.clone(),
                    reason: "action cannot need itself".to_string(),
                });
            }
            if !ids.contains(need.as_str()) {
                return Err(PipelineParseError::InvalidAction {
                    id: id.clone(),
                    reason: format!("needs unknown action '{}'", need),
                });
            }
        }
    }

    Ok(())
}
