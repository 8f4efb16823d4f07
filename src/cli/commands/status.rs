//! Status command - Show the current state and its prompt

use std::path::Path;

use crate::errors::{PhaseflowError, Result};
use crate::fs::get_prompts_dir;
use crate::prompts::render_status_from;

use super::context::ProjectContext;

pub fn run(cwd: Option<&Path>, json: bool) -> Result<()> {
    let context = ProjectContext::open(cwd)?;
    let machine = context.machine()?;

    if json {
        let output = serde_json::to_string_pretty(machine.project())
            .map_err(|e| PhaseflowError::InvalidJson(e.to_string()))?;
        println!("{}", output);
        return Ok(());
    }

    let prompts_dir = get_prompts_dir(&context.root, &context.config);
    let text = render_status_from(&prompts_dir, machine.config(), machine.project())?;
    println!("{}", text.trim_end());
    Ok(())
}
