//! Workflows command - List registered workflows

use crate::errors::Result;
use crate::workflows::default_registry;

pub fn run() -> Result<()> {
    let registry = default_registry()?;
    for workflow in registry.iter() {
        println!("{}", workflow.name());
        if !workflow.description().is_empty() {
            println!("  {}", workflow.description());
        }
        println!("  initial state: {}", workflow.initial_state());
        let phases: Vec<&str> = workflow.phases().iter().map(|p| p.name()).collect();
        println!("  phases: {}", phases.join(", "));
    }
    Ok(())
}
