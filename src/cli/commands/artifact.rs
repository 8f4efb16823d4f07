//! Artifact commands

use std::path::Path;

use crate::errors::Result;

use super::context::run_phase_operation;

pub fn add(cwd: Option<&Path>, phase: &str, path: &str, artifact_type: Option<&str>) -> Result<()> {
    run_phase_operation(cwd, phase, |p| p.add_artifact(path, artifact_type))
}

pub fn approve(cwd: Option<&Path>, phase: &str, path: &str, assessment: Option<&str>) -> Result<()> {
    run_phase_operation(cwd, phase, |p| p.approve_artifact(path, assessment))
}
