//! Task commands

use std::path::Path;

use crate::errors::{PhaseflowError, Result};
use crate::schemas::TaskStatus;

use super::context::run_phase_operation;

pub fn add(cwd: Option<&Path>, phase: &str, id: &str, name: &str, depends_on: &[String]) -> Result<()> {
    let deps: Vec<&str> = depends_on.iter().map(String::as_str).collect();
    run_phase_operation(cwd, phase, |p| p.add_task(id, name, &deps))
}

/// # Errors
/// * `InvalidInput` - `status` is not a task status name
pub fn set_status(cwd: Option<&Path>, phase: &str, id: &str, status: &str) -> Result<()> {
    let status: TaskStatus = status.parse().map_err(PhaseflowError::InvalidInput)?;
    run_phase_operation(cwd, phase, |p| p.set_task_status(id, status))
}
