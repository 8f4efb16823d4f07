//! Built-in workflows

pub mod exploration;
pub mod standard;

use crate::domain::WorkflowRegistry;
use crate::errors::Result;

/// Registry holding every built-in workflow
pub fn default_registry() -> Result<WorkflowRegistry> {
    let mut registry = WorkflowRegistry::new();
    registry.register(standard::workflow()?)?;
    registry.register(exploration::workflow()?)?;
    Ok(registry)
}
