//! Phase commands

use std::path::Path;

use crate::errors::Result;

use super::context::run_phase_operation;

pub fn approve_tasks(cwd: Option<&Path>, phase: &str) -> Result<()> {
    run_phase_operation(cwd, phase, |p| p.approve_tasks())
}

pub fn complete(cwd: Option<&Path>, phase: &str) -> Result<()> {
    run_phase_operation(cwd, phase, |p| p.complete())
}

pub fn skip(cwd: Option<&Path>, phase: &str) -> Result<()> {
    run_phase_operation(cwd, phase, |p| p.skip())
}

pub fn enable(cwd: Option<&Path>, phase: &str) -> Result<()> {
    run_phase_operation(cwd, phase, |p| p.enable())
}
