//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

/// Builder for pipeline YAML documents.
pub struct PipelineBuilder {
    version: String,
    actions: Vec<(String, String, Vec<String>)>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            version: "3.0".to_string(),
            actions: Vec::new(),
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Add an action with the given `run` command.
    pub fn action(mut self, id: &str, run: &str) -> Self {
        self.actions.push((id.to_string(), run.to_string(), Vec::new()));
        self
    }

    /// Add an action that needs other actions.
    pub fn action_needing(mut self, id: &str, run: &str, needs: &[&str]) -> Self {
        self.actions.push((
            id.to_string(),
            run.to_string(),
            needs.iter().map(|n| n.to_string()).collect(),
        ));
        self
    }

    pub fn build(self) -> String {
        let mut yaml = format!("version: \"{}\"\nactions:\n", self.version);
        for (id, run, needs) in self.actions {
            yaml.push_str(&format!("  {}:\n    run: \"{}\"\n", id, run.replace('"', "\\\"")));
            if !needs.is_empty() {
                yaml.push_str(&format!("    needs: [{}]\n", needs.join(", ")));
            }
            yaml.push_str(&format!(
                "    outputs:\n      moderately_sensitive:\n        log: logs/{}.log\n",
                id
            ));
        }
        yaml
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The two-action pipeline used across scenarios.
pub fn cohort_pipeline() -> String {
    PipelineBuilder::new()
        .action(
            "generate_cohort",
            "cohortextractor:0.5.2 generate_cohort --study-def=study_definition.py",
        )
        .action_needing("run_model", "stata-mp:latest analysis/model.do", &["generate_cohort"])
        .build()
}

/// A job row to insert into the harness database.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub id: i64,
    pub job_request_id: i64,
    pub action: String,
    pub status: String,
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
}

impl JobSpec {
    pub fn new(id: i64, job_request_id: i64, action: &str) -> Self {
        Self {
            id,
            job_request_id,
            action: action.to_string(),
            status: "succeeded".to_string(),
            created_at: Some("2021-06-01 12:00:00".to_string()),
            completed_at: None,
        }
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn completed_at(mut self, at: &str) -> Self {
        self.completed_at = Some(at.to_string());
        self
    }
}
