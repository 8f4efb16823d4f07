//! The workflow machine
//!
//! A machine is rebuilt from the persisted record on every invocation,
//! applies transitions from the workflow's table, and saves after each one.

use std::sync::Arc;

use crate::errors::{PhaseflowError, Result};
use crate::fs::StateStore;
use crate::schemas::{Event, ProjectState, State};

use super::builder::WorkflowConfig;
use super::phase::{Phase, PhaseOutcome};
use super::transitions::Selection;

/// Runs one project's record through a workflow
pub struct Machine<S: StateStore> {
    config: Arc<WorkflowConfig>,
    project: ProjectState,
    store: S,
}

impl<S: StateStore> Machine<S> {
    /// Start a new project in the workflow's initial state and save it
    pub fn create(config: Arc<WorkflowConfig>, name: &str, store: S) -> Result<Self> {
        let project = config.new_project(name)?;
        let mut machine = Machine::from_project(config, project, store)?;
        machine.save()?;
        tracing::info!(project = name, state = %machine.state(), "created project");
        Ok(machine)
    }

    /// Load the record from `store` and resume at its stored state
    pub fn resume(config: Arc<WorkflowConfig>, store: S) -> Result<Self> {
        let project = store.load()?;
        Machine::from_project(config, project, store)
    }

    /// Wrap an already loaded record.
    ///
    /// # Errors
    /// * `SchemaValidation` - the record belongs to another workflow
    /// * `UnexpectedState` - the stored state is not part of the workflow
    pub fn from_project(config: Arc<WorkflowConfig>, project: ProjectState, store: S) -> Result<Self> {
        if project.project_type != config.name() {
            return Err(PhaseflowError::SchemaValidation(format!(
                "project {} is a {} project, not {}",
                project.name,
                project.project_type,
                config.name()
            )));
        }
        if !config.table().contains_state(&project.state) {
            return Err(PhaseflowError::UnexpectedState {
                state: project.state.to_string(),
                event: "resume".to_string(),
            });
        }
        Ok(Machine {
            config,
            project,
            store,
        })
    }

    pub fn state(&self) -> &State {
        &self.project.state
    }

    /// Read-only view of the record, e.g. for rendering
    pub fn project(&self) -> &ProjectState {
        &self.project
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_project(self) -> ProjectState {
        self.project
    }

    /// Whether `event` could be fired right now.
    ///
    /// Returns `Ok(false)` when the event is registered for the current
    /// state but no guard passes.
    ///
    /// # Errors
    /// * `UnexpectedState` - the event has no transition from this state
    pub fn can_fire(&self, event: &Event) -> Result<bool> {
        match self.config.table().select(self.state(), event, &self.project) {
            Selection::Unregistered => Err(self.unexpected(event)),
            Selection::Blocked(_) => Ok(false),
            Selection::Eligible(_) => Ok(true),
        }
    }

    /// Fire `event`: run exit/entry actions, change state, then save.
    ///
    /// If an action fails the record is restored to its state before the
    /// call.
    ///
    /// # Errors
    /// * `UnexpectedState` - the event has no transition from this state
    /// * `CannotAdvance` - every guard failed; the reason names them
    /// * `NotSaved` - the transition happened but the save failed
    pub fn fire(&mut self, event: &Event) -> Result<()> {
        let config = Arc::clone(&self.config);
        let transition = match config.table().select(self.state(), event, &self.project) {
            Selection::Unregistered => return Err(self.unexpected(event)),
            Selection::Blocked(reasons) => {
                let reason = if reasons.is_empty() {
                    "no guard satisfied".to_string()
                } else {
                    reasons.join("; ")
                };
                return Err(PhaseflowError::CannotAdvance {
                    state: self.state().to_string(),
                    event: event.to_string(),
                    reason,
                });
            }
            Selection::Eligible(transition) => transition,
        };

        let snapshot = self.project.clone();
        let from = transition.from.clone();

        if let Some(action) = &transition.on_exit {
            if let Err(e) = action.run(&mut self.project) {
                self.project = snapshot;
                return Err(e);
            }
        }
        self.project.state = transition.to.clone();
        if let Some(action) = &transition.on_entry {
            if let Err(e) = action.run(&mut self.project) {
                tracing::warn!(state = %from, event = %event, error = %e, "entry action failed; rolled back");
                self.project = snapshot;
                return Err(e);
            }
        }

        tracing::info!(from = %from, event = %event, to = %transition.to, "transition");

        self.save().map_err(|e| PhaseflowError::NotSaved {
            state: transition.to.to_string(),
            source: Box::new(e),
        })
    }

    /// Fire the event a phase operation asked for, if any
    pub fn apply(&mut self, outcome: PhaseOutcome) -> Result<()> {
        match outcome {
            PhaseOutcome::Nothing => Ok(()),
            PhaseOutcome::Fire(event) => self.fire(&event),
        }
    }

    /// Fire whatever event the current state maps to
    ///
    /// # Errors
    /// * `NotSupported` - the current state has no advance mapping
    pub fn advance(&mut self) -> Result<&State> {
        let event = self
            .config
            .advance_event(self.state())
            .cloned()
            .ok_or_else(|| {
                PhaseflowError::not_supported("advance", format!("state {}", self.state()))
            })?;
        self.fire(&event)?;
        Ok(self.state())
    }

    /// Persist the record through the store
    pub fn save(&mut self) -> Result<()> {
        self.project.touch();
        self.store.save(&self.project)
    }

    /// Borrow one phase for mutation
    ///
    /// # Errors
    /// * `NotFound` - the workflow declares no phase with this name
    pub fn phase(&mut self, name: &str) -> Result<Phase<'_>> {
        let definition = self.config.phase(name).ok_or_else(|| PhaseflowError::NotFound {
            kind: "phase",
            key: name.to_string(),
        })?;
        Ok(Phase::new(definition, &self.config, &mut self.project, &self.store))
    }

    fn unexpected(&self, event: &Event) -> PhaseflowError {
        PhaseflowError::UnexpectedState {
            state: self.state().to_string(),
            event: event.to_string(),
        }
    }
}
