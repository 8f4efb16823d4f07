//! Status prompt loading and rendering
//!
//! Supports {{variable}} substitution and {{#if var}}...{{/if}} /
//! {{#ifnot var}}...{{/ifnot}} conditionals.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

use crate::domain::WorkflowConfig;
use crate::errors::{PhaseflowError, Result};
use crate::schemas::{ProjectState, State};

/// Used when a state has neither a custom nor a registered prompt
const DEFAULT_STATUS_TEMPLATE: &str = "Project {{project}} ({{project_type}}) is in {{state}}.\n\
{{#if description}}{{description}}\n{{/if}}\
Phases:\n{{phases}}\n\
{{#if events}}Events: {{events}}\n{{/if}}\
{{#if next_event}}Next: {{next_event}}\n{{/if}}\
{{#ifnot next_event}}No further events.\n{{/ifnot}}";

/// Variables available for status templates
#[derive(Debug, Clone, Default)]
pub struct StatusVariables {
    /// Project name
    pub project: String,

    /// Workflow name
    pub project_type: String,

    /// Current state
    pub state: String,

    pub description: Option<String>,

    /// One line per phase: name and status
    pub phases: String,

    /// One line per task across every task phase
    pub tasks: String,

    /// One line per artifact across every artifact phase
    pub artifacts: String,

    /// Comma-separated events with a transition out of the current state
    pub events: String,

    /// Event `advance` would fire from the current state
    pub next_event: Option<String>,
}

impl StatusVariables {
    pub fn from_project(config: &WorkflowConfig, project: &ProjectState) -> Self {
        let mut phases = Vec::new();
        let mut tasks = Vec::new();
        let mut artifacts = Vec::new();

        // declaration order, not the record's key order
        for definition in config.phases() {
            let Some(record) = project.phase(definition.name()) else {
                continue;
            };
            let enabled = if record.enabled { "" } else { " (disabled)" };
            phases.push(format!("- {}: {}{}", definition.name(), record.status, enabled));
            for task in &record.tasks {
                tasks.push(format!("- [{}] {} {}", task.status, task.id, task.name));
            }
            for artifact in &record.artifacts {
                let kind = artifact.artifact_type.as_deref().unwrap_or("untyped");
                let approval = match (&artifact.approved, &artifact.assessment) {
                    (true, Some(assessment)) => format!("approved, {}", assessment),
                    (true, None) => "approved".to_string(),
                    (false, _) => "pending".to_string(),
                };
                artifacts.push(format!("- {} [{}] {}", artifact.path, kind, approval));
            }
        }

        StatusVariables {
            project: project.name.clone(),
            project_type: project.project_type.clone(),
            state: project.state.to_string(),
            description: project.description.clone(),
            phases: phases.join("\n"),
            tasks: tasks.join("\n"),
            artifacts: artifacts.join("\n"),
            events: config
                .table()
                .events_from(&project.state)
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            next_event: config.advance_event(&project.state).map(|e| e.to_string()),
        }
    }

    /// Convert to a hashmap of string values for template rendering
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("project".to_string(), self.project.clone());
        map.insert("project_type".to_string(), self.project_type.clone());
        map.insert("state".to_string(), self.state.clone());
        map.insert("phases".to_string(), self.phases.clone());
        map.insert("tasks".to_string(), self.tasks.clone());
        map.insert("artifacts".to_string(), self.artifacts.clone());
        map.insert("events".to_string(), self.events.clone());

        if let Some(ref description) = self.description {
            map.insert("description".to_string(), description.clone());
        }
        if let Some(ref event) = self.next_event {
            map.insert("next_event".to_string(), event.clone());
        }

        map
    }
}

/// Load a custom template for `state` from `prompts_dir`, if one exists.
///
/// Custom templates are named after the state, e.g. `ReviewActive.md`.
pub fn load_status_template(prompts_dir: &Path, state: &State) -> Result<Option<String>> {
    let path = prompts_dir.join(format!("{}.md", state));
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(&path).map(Some).map_err(|e| {
        PhaseflowError::FileNotFound(format!(
            "Failed to read template {}: {}",
            path.display(),
            e
        ))
    })
}

/// Render a template with the given variables.
pub fn render_template(template: &str, vars: &HashMap<String, String>) -> Result<String> {
    let if_regex = compile(r"\{\{#if\s+(\w+)\}\}([\s\S]*?)\{\{/if\}\}")?;
    let ifnot_regex = compile(r"\{\{#ifnot\s+(\w+)\}\}([\s\S]*?)\{\{/ifnot\}\}")?;
    let var_regex = compile(r"\{\{(\w+)\}\}")?;

    // Process {{#if variable}}...{{/if}} blocks
    let result = if_regex
        .replace_all(template, |caps: &regex::Captures| match vars.get(&caps[1]) {
            Some(val) if !val.is_empty() => caps[2].to_string(),
            _ => String::new(),
        })
        .to_string();

    // Process {{#ifnot variable}}...{{/ifnot}} blocks
    let result = ifnot_regex
        .replace_all(&result, |caps: &regex::Captures| match vars.get(&caps[1]) {
            Some(val) if !val.is_empty() => String::new(),
            _ => caps[2].to_string(),
        })
        .to_string();

    // Process {{variable}} substitutions
    let result = var_regex
        .replace_all(&result, |caps: &regex::Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        })
        .to_string();

    Ok(result)
}

/// Render the status text for a project's current state.
///
/// Uses the workflow's prompt for the state, or a generic summary.
pub fn render_status(config: &WorkflowConfig, project: &ProjectState) -> Result<String> {
    let template = config
        .prompt(&project.state)
        .unwrap_or(DEFAULT_STATUS_TEMPLATE);
    render_template(template, &StatusVariables::from_project(config, project).to_map())
}

/// Like [`render_status`], preferring a custom template from `prompts_dir`.
pub fn render_status_from(
    prompts_dir: &Path,
    config: &WorkflowConfig,
    project: &ProjectState,
) -> Result<String> {
    match load_status_template(prompts_dir, &project.state)? {
        Some(template) => {
            tracing::debug!(dir = %prompts_dir.display(), state = %project.state, "using custom template");
            render_template(&template, &StatusVariables::from_project(config, project).to_map())
        }
        None => render_status(config, project),
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| PhaseflowError::wrap(e, "invalid template pattern"))
}
