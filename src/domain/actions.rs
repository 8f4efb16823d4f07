//! Reusable entry and exit actions
//!
//! Workflows attach these to transitions to stamp phase status as the
//! machine moves between states.

use serde_json::Value;

use crate::errors::PhaseflowError;
use crate::schemas::{PhaseRecord, PhaseStatus, ProjectState};

use super::transitions::Action;

fn phase_record<'a>(project: &'a mut ProjectState, phase: &str) -> crate::Result<&'a mut PhaseRecord> {
    project.phase_mut(phase).ok_or_else(|| PhaseflowError::NotFound {
        kind: "phase",
        key: phase.to_string(),
    })
}

fn move_status(project: &mut ProjectState, phase: &str, next: PhaseStatus) -> crate::Result<()> {
    let record = phase_record(project, phase)?;
    let from = record.status;
    if !record.advance_status(next) {
        return Err(PhaseflowError::PhaseStatus {
            phase: phase.to_string(),
            from: from.to_string(),
            to: next.to_string(),
        });
    }
    Ok(())
}

/// Mark a phase enabled and in progress.
///
/// A skipped phase stays skipped. Starting a completed phase is an error;
/// use [`reset_phase`] to reopen it.
pub fn start_phase(phase: &str) -> Action {
    let phase = phase.to_string();
    Action::new(format!("start {}", phase), move |project| {
        let record = phase_record(project, &phase)?;
        record.enabled = true;
        if record.status == PhaseStatus::Skipped {
            return Ok(());
        }
        move_status(project, &phase, PhaseStatus::InProgress)
    })
}

/// Mark a phase completed. A phase already completed or skipped is left as is.
pub fn complete_phase(phase: &str) -> Action {
    let phase = phase.to_string();
    Action::new(format!("complete {}", phase), move |project| {
        if phase_record(project, &phase)?.status.is_finished() {
            return Ok(());
        }
        move_status(project, &phase, PhaseStatus::Completed)
    })
}

/// Reopen a phase and clear the given metadata flags, for review loop-backs
pub fn reset_phase(phase: &str, clear_flags: &[&str]) -> Action {
    let phase = phase.to_string();
    let flags: Vec<String> = clear_flags.iter().map(|f| f.to_string()).collect();
    Action::new(format!("reset {}", phase), move |project| {
        let record = phase_record(project, &phase)?;
        record.reset();
        for flag in &flags {
            record.metadata.remove(flag);
        }
        Ok(())
    })
}

/// Withdraw approval from every artifact of `artifact_type` in a phase.
///
/// Assessments are kept for the record, but guards only read approved
/// artifacts, so a verdict from an earlier round no longer counts.
pub fn retract_approvals(phase: &str, artifact_type: &str) -> Action {
    let phase = phase.to_string();
    let artifact_type = artifact_type.to_string();
    Action::new(
        format!("retract {} approvals in {}", artifact_type, phase),
        move |project| {
            let record = phase_record(project, &phase)?;
            for artifact in record.artifacts.iter_mut().filter(|a| a.is_type(&artifact_type)) {
                artifact.approved = false;
            }
            Ok(())
        },
    )
}

/// Set a metadata value on a phase
pub fn set_metadata(phase: &str, key: &str, value: Value) -> Action {
    let phase = phase.to_string();
    let key = key.to_string();
    Action::new(format!("set {}.{}", phase, key), move |project| {
        phase_record(project, &phase)?
            .metadata
            .insert(key.clone(), value.clone());
        Ok(())
    })
}

/// Run several actions in order, stopping at the first failure
pub fn chain(actions: Vec<Action>) -> Action {
    let description = actions
        .iter()
        .map(|a| a.description().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Action::new(description, move |project| {
        for action in &actions {
            action.run(project)?;
        }
        Ok(())
    })
}
