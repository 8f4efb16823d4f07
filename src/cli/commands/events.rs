//! Event commands - can-fire, fire and advance

use std::path::Path;

use crate::errors::Result;
use crate::schemas::Event;

use super::context::ProjectContext;

/// Print whether `event` could fire; an unregistered event is an error
pub fn can_fire(cwd: Option<&Path>, event: &str) -> Result<()> {
    let context = ProjectContext::open(cwd)?;
    let machine = context.machine()?;
    let allowed = machine.can_fire(&Event::new(event))?;
    println!("{}", if allowed { "yes" } else { "no" });
    Ok(())
}

pub fn fire(cwd: Option<&Path>, event: &str) -> Result<()> {
    let context = ProjectContext::open(cwd)?;
    let mut machine = context.machine()?;
    let from = machine.state().clone();
    machine.fire(&Event::new(event))?;
    println!("{} --{}--> {}", from, event, machine.state());
    Ok(())
}

pub fn advance(cwd: Option<&Path>) -> Result<()> {
    let context = ProjectContext::open(cwd)?;
    let mut machine = context.machine()?;
    let from = machine.state().clone();
    let to = machine.advance()?;
    println!("{} --> {}", from, to);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{artifact, init};
    use crate::errors::{ErrorKind, PhaseflowError};
    use crate::fs::{get_state_path, JsonFileStore, StateStore};
    use crate::schemas::Config;
    use tempfile::TempDir;

    fn state(root: &Path) -> String {
        let store = JsonFileStore::new(get_state_path(root, &Config::default()));
        store.load().unwrap().state.to_string()
    }

    #[test]
    fn test_commands_drive_planning() {
        let temp = TempDir::new().unwrap();
        let cwd = Some(temp.path());
        init::run(cwd, "auth", None, None, false).unwrap();

        can_fire(cwd, "CompletePlanning").unwrap();
        let err = advance(cwd).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CannotAdvance);

        artifact::add(cwd, "planning", "tasks.md", Some("task_list")).unwrap();
        artifact::approve(cwd, "planning", "tasks.md", None).unwrap();
        fire(cwd, "CompletePlanning").unwrap();
        assert_eq!(state(temp.path()), "ImplementationPlanning");
    }

    #[test]
    fn test_unknown_event_is_unexpected_state() {
        let temp = TempDir::new().unwrap();
        init::run(Some(temp.path()), "auth", None, None, false).unwrap();
        let err = fire(Some(temp.path()), "CompleteReview").unwrap_err();
        assert!(matches!(err, PhaseflowError::UnexpectedState { .. }));
    }

    #[test]
    fn test_commands_need_a_project() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".phaseflow")).unwrap();
        let err = advance(Some(temp.path())).unwrap_err();
        assert!(matches!(err, PhaseflowError::ProjectNotFound(_)));
    }
}
