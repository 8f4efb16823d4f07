//! Guard predicates for state transitions
//!
//! Guards are pure checks over the project record, evaluated at the moment
//! a transition is requested. A failed guard carries a human-readable reason.

use std::sync::Arc;

use crate::schemas::{PhaseRecord, ProjectState};

use super::dependencies::validate_dependencies;

/// Result of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardResult {
    /// Whether the guard passed
    pub valid: bool,

    /// Reason for failure (if valid is false)
    pub reason: Option<String>,
}

impl GuardResult {
    /// Create a passing result
    pub fn success() -> Self {
        GuardResult {
            valid: true,
            reason: None,
        }
    }

    /// Create a failing result
    pub fn failure(reason: impl Into<String>) -> Self {
        GuardResult {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

type GuardFn = dyn Fn(&ProjectState) -> GuardResult + Send + Sync;

/// A named predicate gating a transition
#[derive(Clone)]
pub struct Guard {
    description: String,
    check: Arc<GuardFn>,
}

impl Guard {
    pub fn new<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&ProjectState) -> GuardResult + Send + Sync + 'static,
    {
        Guard {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    /// Build a guard from a plain boolean predicate; the description doubles
    /// as the failure reason.
    pub fn predicate<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(&ProjectState) -> bool + Send + Sync + 'static,
    {
        let description = description.into();
        let reason = description.clone();
        Guard::new(description, move |project| {
            if check(project) {
                GuardResult::success()
            } else {
                GuardResult::failure(format!("{} is not satisfied", reason))
            }
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn evaluate(&self, project: &ProjectState) -> GuardResult {
        (self.check)(project)
    }
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

fn with_phase(
    project: &ProjectState,
    phase: &str,
    check: impl FnOnce(&PhaseRecord) -> GuardResult,
) -> GuardResult {
    match project.phase(phase) {
        Some(record) => check(record),
        None => GuardResult::failure(format!("phase {} does not exist", phase)),
    }
}

/// The phase holds at least `n` tasks
pub fn min_task_count(phase: &str, n: usize) -> Guard {
    let phase = phase.to_string();
    Guard::new(format!("{} has at least {} task(s)", phase, n), move |project| {
        with_phase(project, &phase, |record| {
            if record.tasks.len() >= n {
                GuardResult::success()
            } else {
                GuardResult::failure(format!(
                    "{} has {} task(s), at least {} required",
                    phase,
                    record.tasks.len(),
                    n
                ))
            }
        })
    })
}

/// Every task in the phase is completed or abandoned
pub fn all_tasks_resolved(phase: &str) -> Guard {
    let phase = phase.to_string();
    Guard::new(format!("all {} tasks resolved", phase), move |project| {
        with_phase(project, &phase, |record| {
            let open: Vec<&str> = record
                .tasks
                .iter()
                .filter(|t| !t.status.is_resolved())
                .map(|t| t.id.as_str())
                .collect();
            if open.is_empty() {
                GuardResult::success()
            } else {
                GuardResult::failure(format!(
                    "{} has unresolved tasks: {}",
                    phase,
                    open.join(", ")
                ))
            }
        })
    })
}

/// The phase holds an approved artifact of the given type
pub fn has_approved_artifact_of_type(phase: &str, artifact_type: &str) -> Guard {
    let phase = phase.to_string();
    let artifact_type = artifact_type.to_string();
    Guard::new(
        format!("{} artifact approved in {}", artifact_type, phase),
        move |project| {
            with_phase(project, &phase, |record| {
                let approved = record
                    .artifacts
                    .iter()
                    .any(|a| a.approved && a.is_type(&artifact_type));
                if approved {
                    GuardResult::success()
                } else {
                    GuardResult::failure(format!(
                        "{} artifact not approved in {}",
                        artifact_type, phase
                    ))
                }
            })
        },
    )
}

/// An approved artifact of the given type carries the given assessment
pub fn artifact_assessment(phase: &str, artifact_type: &str, assessment: &str) -> Guard {
    let phase = phase.to_string();
    let artifact_type = artifact_type.to_string();
    let assessment = assessment.to_string();
    Guard::new(
        format!("{} artifact in {} assessed {}", artifact_type, phase, assessment),
        move |project| {
            with_phase(project, &phase, |record| {
                let latest = record
                    .artifacts
                    .iter()
                    .rev()
                    .find(|a| a.approved && a.is_type(&artifact_type));
                match latest {
                    Some(a) if a.assessment.as_deref() == Some(assessment.as_str()) => {
                        GuardResult::success()
                    }
                    Some(a) => GuardResult::failure(format!(
                        "{} artifact {} is assessed {}, not {}",
                        artifact_type,
                        a.path,
                        a.assessment.as_deref().unwrap_or("(none)"),
                        assessment
                    )),
                    None => GuardResult::failure(format!(
                        "{} artifact not approved in {}",
                        artifact_type, phase
                    )),
                }
            })
        },
    )
}

/// Completed tasks reference only existing tasks and form no cycle
pub fn dependencies_valid(phase: &str) -> Guard {
    let phase = phase.to_string();
    Guard::new(format!("{} task dependencies valid", phase), move |project| {
        with_phase(project, &phase, |record| match validate_dependencies(&record.tasks) {
            Ok(()) => GuardResult::success(),
            Err(violation) => {
                GuardResult::failure(format!("invalid dependencies in {}: {}", phase, violation))
            }
        })
    })
}

/// A boolean metadata flag on the phase is set to `true`
pub fn metadata_flag(phase: &str, key: &str) -> Guard {
    let phase = phase.to_string();
    let key = key.to_string();
    Guard::new(format!("{} {} set", phase, key), move |project| {
        with_phase(project, &phase, |record| {
            if record.flag(&key) {
                GuardResult::success()
            } else {
                GuardResult::failure(format!("{} is not set on {}", key, phase))
            }
        })
    })
}

/// Every guard passes; reports the first failure
pub fn all_of(guards: Vec<Guard>) -> Guard {
    let description = guards
        .iter()
        .map(|g| g.description().to_string())
        .collect::<Vec<_>>()
        .join(" and ");
    Guard::new(description, move |project| {
        for guard in &guards {
            let result = guard.evaluate(project);
            if !result.valid {
                return result;
            }
        }
        GuardResult::success()
    })
}
