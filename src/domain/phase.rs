//! Phase operations
//!
//! A [`Phase`] mutates one phase record and saves it, then tells the caller
//! which event (if any) should be fired next. It never fires the event
//! itself, so the same phase shape works under any transition graph.

use serde_json::Value;

use crate::errors::{PhaseflowError, Result};
use crate::fs::StateStore;
use crate::schemas::{Artifact, Event, PhaseRecord, PhaseStatus, ProjectState, Task, TaskStatus};

use super::builder::{PhaseDefinition, PhaseOperation, WorkflowConfig};

/// Metadata flag set by `approve_tasks`
pub const TASKS_APPROVED_KEY: &str = "tasks_approved";

/// What the caller should do after a phase operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Nothing further to do
    Nothing,
    /// Ask the machine to fire this event
    Fire(Event),
}

impl PhaseOutcome {
    pub fn event(&self) -> Option<&Event> {
        match self {
            PhaseOutcome::Nothing => None,
            PhaseOutcome::Fire(event) => Some(event),
        }
    }
}

/// Borrowed handle to one phase of a running machine
pub struct Phase<'a> {
    definition: &'a PhaseDefinition,
    config: &'a WorkflowConfig,
    project: &'a mut ProjectState,
    store: &'a dyn StateStore,
}

impl<'a> Phase<'a> {
    pub(crate) fn new(
        definition: &'a PhaseDefinition,
        config: &'a WorkflowConfig,
        project: &'a mut ProjectState,
        store: &'a dyn StateStore,
    ) -> Self {
        Phase {
            definition,
            config,
            project,
            store,
        }
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Read-only view of the phase record
    pub fn record(&self) -> Option<&PhaseRecord> {
        self.project.phase(self.definition.name())
    }

    /// Register a new artifact
    ///
    /// # Errors
    /// * `NotSupported` - task phase, or phase disabled
    /// * `Duplicate` - an artifact with this path already exists
    pub fn add_artifact(&mut self, path: &str, artifact_type: Option<&str>) -> Result<PhaseOutcome> {
        let outcome = self.mutate(PhaseOperation::AddArtifact, |record| {
            if record.artifact(path).is_some() {
                return Err(PhaseflowError::Duplicate {
                    kind: "artifact",
                    key: path.to_string(),
                });
            }
            record.artifacts.push(Artifact::new(
                path.to_string(),
                artifact_type.map(str::to_string),
            ));
            Ok(())
        })?;
        tracing::info!(phase = %self.name(), path, "added artifact");
        Ok(outcome)
    }

    /// Approve an artifact. Approving twice is not an error.
    ///
    /// # Errors
    /// * `NotSupported` - task phase, or phase disabled
    /// * `NotFound` - no artifact with this path
    pub fn approve_artifact(&mut self, path: &str, assessment: Option<&str>) -> Result<PhaseOutcome> {
        let outcome = self.mutate(PhaseOperation::ApproveArtifact, |record| {
            let artifact = record
                .artifacts
                .iter_mut()
                .find(|a| a.path == path)
                .ok_or_else(|| PhaseflowError::NotFound {
                    kind: "artifact",
                    key: path.to_string(),
                })?;
            artifact.approved = true;
            if let Some(assessment) = assessment {
                artifact.assessment = Some(assessment.to_string());
            }
            Ok(())
        })?;
        tracing::info!(phase = %self.name(), path, "approved artifact");
        Ok(outcome)
    }

    /// Register a new pending task with optional sibling dependencies
    ///
    /// Dependencies are not checked here; the dependency guard does that.
    pub fn add_task(&mut self, id: &str, name: &str, dependencies: &[&str]) -> Result<PhaseOutcome> {
        let outcome = self.mutate(PhaseOperation::AddTask, |record| {
            if record.task(id).is_some() {
                return Err(PhaseflowError::Duplicate {
                    kind: "task",
                    key: id.to_string(),
                });
            }
            let mut task = Task::new(id.to_string(), name.to_string());
            if !dependencies.is_empty() {
                task = task.with_dependencies(dependencies);
            }
            record.tasks.push(task);
            Ok(())
        })?;
        tracing::info!(phase = %self.name(), task = id, "added task");
        Ok(outcome)
    }

    /// Change a task's status
    pub fn set_task_status(&mut self, id: &str, status: TaskStatus) -> Result<PhaseOutcome> {
        let outcome = self.mutate(PhaseOperation::UpdateTask, |record| {
            let task = record
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| PhaseflowError::NotFound {
                    kind: "task",
                    key: id.to_string(),
                })?;
            task.set_status(status);
            Ok(())
        })?;
        tracing::info!(phase = %self.name(), task = id, status = %status, "updated task");
        Ok(outcome)
    }

    /// Set a phase metadata value
    pub fn set_metadata(&mut self, key: &str, value: Value) -> Result<PhaseOutcome> {
        self.mutate(PhaseOperation::SetMetadata, |record| {
            record.metadata.insert(key.to_string(), value);
            Ok(())
        })
    }

    /// Record human approval of the task list
    pub fn approve_tasks(&mut self) -> Result<PhaseOutcome> {
        let outcome = self.mutate(PhaseOperation::ApproveTasks, |record| {
            record
                .metadata
                .insert(TASKS_APPROVED_KEY.to_string(), Value::Bool(true));
            Ok(())
        })?;
        tracing::info!(phase = %self.name(), "approved tasks");
        Ok(outcome)
    }

    pub fn complete(&mut self) -> Result<PhaseOutcome> {
        self.move_status(PhaseOperation::Complete, PhaseStatus::Completed)
    }

    pub fn skip(&mut self) -> Result<PhaseOutcome> {
        self.move_status(PhaseOperation::Skip, PhaseStatus::Skipped)
    }

    /// Turn on a phase declared disabled
    pub fn enable(&mut self) -> Result<PhaseOutcome> {
        let outcome = self.mutate(PhaseOperation::Enable, |record| {
            record.enabled = true;
            Ok(())
        })?;
        tracing::info!(phase = %self.name(), "enabled phase");
        Ok(outcome)
    }

    /// Resolve the event to fire from the current state.
    ///
    /// # Errors
    /// * `NotSupported` - the current state has no advance mapping
    pub fn advance(&self) -> Result<PhaseOutcome> {
        let state = &self.project.state;
        match self.config.advance_event(state) {
            Some(event) => Ok(PhaseOutcome::Fire(event.clone())),
            None => Err(PhaseflowError::not_supported(
                "advance",
                format!("state {} in phase {}", state, self.name()),
            )),
        }
    }

    fn move_status(&mut self, operation: PhaseOperation, next: PhaseStatus) -> Result<PhaseOutcome> {
        let name = self.name().to_string();
        let outcome = self.mutate(operation, |record| {
            let from = record.status;
            if !record.advance_status(next) {
                return Err(PhaseflowError::PhaseStatus {
                    phase: name.clone(),
                    from: from.to_string(),
                    to: next.to_string(),
                });
            }
            Ok(())
        })?;
        tracing::info!(phase = %name, status = %next, "phase status changed");
        Ok(outcome)
    }

    /// Apply `change` to the phase record and save.
    ///
    /// The record is restored if `change` or the save fails, so a failed
    /// operation never lingers in memory.
    fn mutate<F>(&mut self, operation: PhaseOperation, change: F) -> Result<PhaseOutcome>
    where
        F: FnOnce(&mut PhaseRecord) -> Result<()>,
    {
        let snapshot = self.project.clone();
        if let Err(e) = self.apply_and_save(operation, change) {
            *self.project = snapshot;
            return Err(e);
        }
        Ok(match self.definition.event_for(operation) {
            Some(event) => PhaseOutcome::Fire(event.clone()),
            None => PhaseOutcome::Nothing,
        })
    }

    fn apply_and_save<F>(&mut self, operation: PhaseOperation, change: F) -> Result<()>
    where
        F: FnOnce(&mut PhaseRecord) -> Result<()>,
    {
        let record = self.check(operation)?;
        change(record)?;
        self.project.touch();
        self.store.save(self.project)
    }

    /// Shape and enablement checks shared by every mutating operation
    fn check(&mut self, operation: PhaseOperation) -> Result<&mut PhaseRecord> {
        if !self.definition.supports(operation) {
            return Err(PhaseflowError::not_supported(
                operation.as_str(),
                format!("{:?} phase {}", self.definition.shape(), self.definition.name()),
            ));
        }
        let name = self.definition.name();
        let record = self
            .project
            .phases
            .get_mut(name)
            .ok_or_else(|| PhaseflowError::NotFound {
                kind: "phase",
                key: name.to_string(),
            })?;
        if !record.enabled && operation != PhaseOperation::Enable {
            return Err(PhaseflowError::not_supported(
                operation.as_str(),
                format!("disabled phase {}", name),
            ));
        }
        Ok(record)
    }
}
