//! Config schema - Configuration for phaseflow

use serde::{Deserialize, Serialize};

/// Main configuration for phaseflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for forward compatibility
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Workflow used by `init` when no type is given
    #[serde(default = "default_project_type")]
    pub default_project_type: String,

    /// File name of the project record inside `.phaseflow`
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Directory holding custom prompt templates, relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts_dir: Option<String>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_project_type() -> String {
    "standard".to_string()
}

fn default_state_file() -> String {
    "project.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            schema_version: 1,
            default_project_type: default_project_type(),
            state_file: default_state_file(),
            prompts_dir: None,
        }
    }
}
