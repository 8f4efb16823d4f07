//! Init command - Create a new phaseflow project

use std::path::Path;

use crate::config::load_config;
use crate::domain::Machine;
use crate::errors::{PhaseflowError, Result};
use crate::fs::{get_config_path, get_state_path, resolve_cwd, write_json, JsonFileStore};
use crate::workflows::default_registry;

/// Initialize `.phaseflow` in the working directory and create the record.
///
/// # Errors
/// * `Duplicate` - a record already exists and `force` is not set
/// * `NotFound` - the requested workflow is not registered
pub fn run(
    cwd: Option<&Path>,
    name: &str,
    project_type: Option<&str>,
    description: Option<&str>,
    force: bool,
) -> Result<()> {
    let root = resolve_cwd(cwd);
    let config = load_config(&root)?;
    let project_type = project_type.unwrap_or(&config.default_project_type);
    let workflow = default_registry()?.get(project_type)?;

    let store = JsonFileStore::new(get_state_path(&root, &config));
    if store.exists() && !force {
        return Err(PhaseflowError::Duplicate {
            kind: "project",
            key: format!("{} (use --force to replace it)", store.path().display()),
        });
    }

    let config_path = get_config_path(&root);
    if !config_path.exists() {
        write_json(&config_path, &config)?;
    }

    let project = workflow
        .new_project(name)?
        .with_description(description.map(str::to_string));
    let mut machine = Machine::from_project(workflow, project, store)?;
    machine.save()?;
    tracing::info!(project = name, state = %machine.state(), "created project");
    println!(
        "Created {} project {} in state {}",
        machine.config().name(),
        name,
        machine.state()
    );
    Ok(())
}
