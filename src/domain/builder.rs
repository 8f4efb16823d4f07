//! Workflow builder
//!
//! Each concrete workflow assembles its phases, transitions and advance
//! mapping here. `build()` validates the result and freezes it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::errors::{PhaseflowError, Result};
use crate::schemas::{Event, PhaseRecord, ProjectState, State};

use super::transitions::{Transition, TransitionTable};

/// Which collection a phase works with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseShape {
    Artifacts,
    Tasks,
}

/// Mutating operations a phase can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseOperation {
    AddArtifact,
    ApproveArtifact,
    AddTask,
    UpdateTask,
    SetMetadata,
    ApproveTasks,
    Complete,
    Skip,
    Enable,
}

impl PhaseOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseOperation::AddArtifact => "add_artifact",
            PhaseOperation::ApproveArtifact => "approve_artifact",
            PhaseOperation::AddTask => "add_task",
            PhaseOperation::UpdateTask => "set_task_status",
            PhaseOperation::SetMetadata => "set_metadata",
            PhaseOperation::ApproveTasks => "approve_tasks",
            PhaseOperation::Complete => "complete",
            PhaseOperation::Skip => "skip",
            PhaseOperation::Enable => "enable",
        }
    }
}

impl std::fmt::Display for PhaseOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one phase of a workflow
#[derive(Debug, Clone)]
pub struct PhaseDefinition {
    name: String,
    shape: PhaseShape,
    enabled: bool,
    events: HashMap<PhaseOperation, Event>,
}

impl PhaseDefinition {
    /// A phase that collects artifacts
    pub fn artifacts(name: &str) -> Self {
        PhaseDefinition::new(name, PhaseShape::Artifacts)
    }

    /// A phase that collects tasks
    pub fn tasks(name: &str) -> Self {
        PhaseDefinition::new(name, PhaseShape::Tasks)
    }

    fn new(name: &str, shape: PhaseShape) -> Self {
        PhaseDefinition {
            name: name.to_string(),
            shape,
            enabled: true,
            events: HashMap::new(),
        }
    }

    /// Start the phase disabled; `enable` turns it on
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Return `event` to the caller after `operation` succeeds
    pub fn on(mut self, operation: PhaseOperation, event: impl Into<Event>) -> Self {
        self.events.insert(operation, event.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> PhaseShape {
        self.shape
    }

    pub fn enabled_by_default(&self) -> bool {
        self.enabled
    }

    pub fn event_for(&self, operation: PhaseOperation) -> Option<&Event> {
        self.events.get(&operation)
    }

    /// Whether this phase's shape allows `operation`
    pub fn supports(&self, operation: PhaseOperation) -> bool {
        match operation {
            PhaseOperation::AddArtifact | PhaseOperation::ApproveArtifact => {
                self.shape == PhaseShape::Artifacts
            }
            PhaseOperation::AddTask | PhaseOperation::UpdateTask | PhaseOperation::ApproveTasks => {
                self.shape == PhaseShape::Tasks
            }
            PhaseOperation::SetMetadata
            | PhaseOperation::Complete
            | PhaseOperation::Skip
            | PhaseOperation::Enable => true,
        }
    }
}

type Initializer = dyn Fn(&mut ProjectState) -> Result<()> + Send + Sync;

/// A validated, immutable workflow definition
pub struct WorkflowConfig {
    name: String,
    description: String,
    initial: State,
    table: TransitionTable,
    phases: Vec<PhaseDefinition>,
    advance: HashMap<State, Event>,
    prompts: HashMap<State, String>,
    initializer: Option<Arc<Initializer>>,
}

impl WorkflowConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn initial_state(&self) -> &State {
        &self.initial
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Phase definitions in declaration order
    pub fn phases(&self) -> &[PhaseDefinition] {
        &self.phases
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseDefinition> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// The event `advance` fires from `state`, if any
    pub fn advance_event(&self, state: &State) -> Option<&Event> {
        self.advance.get(state)
    }

    /// Status prompt template for `state`, if one is registered
    pub fn prompt(&self, state: &State) -> Option<&str> {
        self.prompts.get(state).map(String::as_str)
    }

    /// Create a fresh record in the initial state with every phase present
    pub fn new_project(&self, name: &str) -> Result<ProjectState> {
        let mut project =
            ProjectState::new(name.to_string(), self.name.clone(), self.initial.clone());
        for phase in &self.phases {
            project
                .phases
                .insert(phase.name.clone(), PhaseRecord::new(phase.enabled));
        }
        if let Some(init) = &self.initializer {
            init(&mut project)?;
        }
        Ok(project)
    }
}

impl std::fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("name", &self.name)
            .field("initial", &self.initial)
            .field("phases", &self.phases)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for a [`WorkflowConfig`]
pub struct WorkflowBuilder {
    name: String,
    description: String,
    initial: State,
    transitions: Vec<Transition>,
    phases: Vec<PhaseDefinition>,
    advance: Vec<(State, Event)>,
    prompts: HashMap<State, String>,
    initializer: Option<Arc<Initializer>>,
}

impl WorkflowBuilder {
    pub fn new(name: &str, initial: impl Into<State>) -> Self {
        WorkflowBuilder {
            name: name.to_string(),
            description: String::new(),
            initial: initial.into(),
            transitions: Vec::new(),
            phases: Vec::new(),
            advance: Vec::new(),
            prompts: HashMap::new(),
            initializer: None,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn phase(mut self, phase: PhaseDefinition) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Event that `advance` fires while in `state`
    pub fn on_advance(mut self, state: impl Into<State>, event: impl Into<Event>) -> Self {
        self.advance.push((state.into(), event.into()));
        self
    }

    /// Status prompt template shown while in `state`
    pub fn prompt(mut self, state: impl Into<State>, template: &str) -> Self {
        self.prompts.insert(state.into(), template.to_string());
        self
    }

    /// Extra setup run on records created by `new_project`
    pub fn initializer<F>(mut self, init: F) -> Self
    where
        F: Fn(&mut ProjectState) -> Result<()> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(init));
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    /// * `Validation` - ambiguous transitions, an unknown initial state,
    ///   duplicate phases, invalid phase events or advance mappings
    pub fn build(self) -> Result<WorkflowConfig> {
        let mut names = HashSet::new();
        for phase in &self.phases {
            if !names.insert(phase.name.as_str()) {
                return Err(PhaseflowError::Validation(format!(
                    "workflow {} declares phase {} twice",
                    self.name, phase.name
                )));
            }
            for operation in phase.events.keys() {
                if !phase.supports(*operation) {
                    return Err(PhaseflowError::Validation(format!(
                        "phase {} maps an event to {}, which its shape does not support",
                        phase.name, operation
                    )));
                }
            }
        }

        let table = TransitionTable::new(self.transitions)?;
        if !table.contains_state(&self.initial) {
            return Err(PhaseflowError::Validation(format!(
                "initial state {} of workflow {} has no transitions",
                self.initial, self.name
            )));
        }

        let mut advance = HashMap::new();
        for (state, event) in self.advance {
            if table.lookup(&state, &event).is_empty() {
                return Err(PhaseflowError::Validation(format!(
                    "advance from {} fires {}, which has no transition from that state",
                    state, event
                )));
            }
            if advance.insert(state.clone(), event).is_some() {
                return Err(PhaseflowError::Validation(format!(
                    "advance mapping for {} declared twice",
                    state
                )));
            }
        }

        for state in table.unreachable_from(&self.initial) {
            tracing::warn!(workflow = %self.name, state = %state, "state is unreachable from the initial state");
        }
        for state in self.prompts.keys() {
            if !table.contains_state(state) {
                tracing::warn!(workflow = %self.name, state = %state, "prompt registered for unknown state");
            }
        }

        Ok(WorkflowConfig {
            name: self.name,
            description: self.description,
            initial: self.initial,
            table,
            phases: self.phases,
            advance,
            prompts: self.prompts,
            initializer: self.initializer,
        })
    }
}
