//! Exploration workflow: run investigative tasks, then write a summary.

use crate::domain::actions::{complete_phase, start_phase};
use crate::domain::guards::{all_of, all_tasks_resolved, has_approved_artifact_of_type, min_task_count};
use crate::domain::{PhaseDefinition, PhaseOperation, Transition, WorkflowBuilder, WorkflowConfig};
use crate::errors::Result;
use crate::schemas::PhaseStatus;

pub const NAME: &str = "exploration";

pub const EXPLORATION_ACTIVE: &str = "ExplorationActive";
pub const SUMMARIZING: &str = "Summarizing";
pub const COMPLETED: &str = "Completed";

pub const BEGIN_SUMMARIZING: &str = "BeginSummarizing";
pub const COMPLETE_EXPLORATION: &str = "CompleteExploration";

const EXPLORING_PROMPT: &str = "Project {{project}} is exploring.\n\
{{#if tasks}}Questions:\n{{tasks}}\n{{/if}}{{#ifnot tasks}}Add a task for each question to investigate.\n{{/ifnot}}\
Resolve every task, then move on to the summary.";

const SUMMARIZING_PROMPT: &str = "Project {{project}} is summarizing.\n\
Register the findings as a summary artifact and approve it to finish.";

pub fn workflow() -> Result<WorkflowConfig> {
    WorkflowBuilder::new(NAME, EXPLORATION_ACTIVE)
        .description("Investigate open questions and summarize the findings")
        .phase(PhaseDefinition::tasks("exploration"))
        .phase(
            PhaseDefinition::artifacts("summary")
                .disabled()
                .on(PhaseOperation::ApproveArtifact, COMPLETE_EXPLORATION),
        )
        .transition(
            Transition::new(EXPLORATION_ACTIVE, BEGIN_SUMMARIZING, SUMMARIZING)
                .guard(all_of(vec![
                    min_task_count("exploration", 1),
                    all_tasks_resolved("exploration"),
                ]))
                .on_exit(complete_phase("exploration"))
                .on_entry(start_phase("summary")),
        )
        .transition(
            Transition::new(SUMMARIZING, COMPLETE_EXPLORATION, COMPLETED)
                .guard(has_approved_artifact_of_type("summary", "summary"))
                .on_exit(complete_phase("summary")),
        )
        .on_advance(EXPLORATION_ACTIVE, BEGIN_SUMMARIZING)
        .on_advance(SUMMARIZING, COMPLETE_EXPLORATION)
        .prompt(EXPLORATION_ACTIVE, EXPLORING_PROMPT)
        .prompt(SUMMARIZING, SUMMARIZING_PROMPT)
        .initializer(|project| {
            if let Some(exploration) = project.phase_mut("exploration") {
                exploration.advance_status(PhaseStatus::InProgress);
            }
            Ok(())
        })
        .build()
}
