//! Project schema - the persisted record a workflow machine runs against

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{PhaseRecord, State};

/// Current record layout version
pub const SCHEMA_VERSION: u32 = 1;

/// The persisted state of one tracked project.
///
/// This is the only place workflow progress lives; a machine is rebuilt
/// from it on every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    /// Schema version for forward compatibility
    pub schema_version: u32,

    /// Project name
    pub name: String,

    /// Name of the workflow this project follows (e.g. "standard")
    pub project_type: String,

    /// Current workflow state
    pub state: State,

    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Phase records keyed by phase name
    #[serde(default)]
    pub phases: BTreeMap<String, PhaseRecord>,

    /// ISO 8601 creation timestamp
    pub created_at: String,

    /// ISO 8601 last update timestamp
    pub updated_at: String,
}

impl ProjectState {
    /// Create a new record with no phases
    pub fn new(name: String, project_type: String, state: State) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        ProjectState {
            schema_version: SCHEMA_VERSION,
            name,
            project_type,
            state,
            description: None,
            phases: BTreeMap::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseRecord> {
        self.phases.get(name)
    }

    pub fn phase_mut(&mut self, name: &str) -> Option<&mut PhaseRecord> {
        self.phases.get_mut(name)
    }

    /// Return a new record with the given description
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Update the `updated_at` timestamp
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
