//! Shared setup for commands that act on an existing project

use std::path::{Path, PathBuf};

use crate::config::load_config;
use crate::domain::{Machine, Phase, PhaseOutcome, WorkflowRegistry};
use crate::errors::{PhaseflowError, Result};
use crate::fs::{find_project_root, get_state_path, resolve_cwd, JsonFileStore, StateStore};
use crate::schemas::Config;
use crate::workflows::default_registry;

/// Project root, its configuration and the workflow registry
pub struct ProjectContext {
    pub root: PathBuf,
    pub config: Config,
    pub registry: WorkflowRegistry,
}

impl ProjectContext {
    /// Locate the project containing `cwd` and load its configuration
    pub fn open(cwd: Option<&Path>) -> Result<Self> {
        let root = find_project_root(&resolve_cwd(cwd))?;
        let config = load_config(&root)?;
        Ok(ProjectContext {
            root,
            config,
            registry: default_registry()?,
        })
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(get_state_path(&self.root, &self.config))
    }

    /// Load the record and resume its workflow
    ///
    /// # Errors
    /// * `ProjectNotFound` - `.phaseflow` exists but holds no record yet
    /// * `NotFound` - the record names a workflow that is not registered
    pub fn machine(&self) -> Result<Machine<JsonFileStore>> {
        let store = self.store();
        if !store.exists() {
            return Err(PhaseflowError::ProjectNotFound(format!(
                "no project record at {}; run `phaseflow init <name>`",
                store.path().display()
            )));
        }
        let project = store.load()?;
        let workflow = self.registry.get(&project.project_type)?;
        Machine::from_project(workflow, project, store)
    }
}

/// Run one phase operation, then fire the event it returns, if any.
///
/// The operation is saved before the event fires, so a guard that blocks
/// the event is reported without failing the command.
pub fn run_phase_operation<F>(cwd: Option<&Path>, phase: &str, operation: F) -> Result<()>
where
    F: FnOnce(&mut Phase<'_>) -> Result<PhaseOutcome>,
{
    let context = ProjectContext::open(cwd)?;
    let mut machine = context.machine()?;
    let outcome = {
        let mut phase = machine.phase(phase)?;
        operation(&mut phase)?
    };

    let Some(event) = outcome.event().cloned() else {
        println!("Saved. State: {}", machine.state());
        return Ok(());
    };

    let from = machine.state().clone();
    match machine.apply(outcome) {
        Ok(()) => {
            println!("{} --{}--> {}", from, event, machine.state());
            Ok(())
        }
        Err(PhaseflowError::CannotAdvance { reason, .. }) => {
            println!("Saved. {} is blocked: {}", event, reason);
            println!("State: {}", machine.state());
            Ok(())
        }
        Err(e) => Err(e),
    }
}
