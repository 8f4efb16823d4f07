//! Standard project workflow
//!
//! planning → implementation (planning, executing) → review → finalize.
//! A failed review loops back to implementation planning.

use crate::domain::actions::{chain, complete_phase, reset_phase, retract_approvals, start_phase};
use crate::domain::guards::{
    all_of, all_tasks_resolved, artifact_assessment, dependencies_valid,
    has_approved_artifact_of_type, metadata_flag, min_task_count,
};
use crate::domain::{
    PhaseDefinition, PhaseOperation, Transition, WorkflowBuilder, WorkflowConfig,
    TASKS_APPROVED_KEY,
};
use crate::errors::Result;
use crate::schemas::PhaseStatus;

pub const NAME: &str = "standard";

pub const PLANNING_ACTIVE: &str = "PlanningActive";
pub const IMPLEMENTATION_PLANNING: &str = "ImplementationPlanning";
pub const IMPLEMENTATION_EXECUTING: &str = "ImplementationExecuting";
pub const REVIEW_ACTIVE: &str = "ReviewActive";
pub const FINALIZE_CHECKS: &str = "FinalizeChecks";
pub const COMPLETED: &str = "Completed";

pub const COMPLETE_PLANNING: &str = "CompletePlanning";
pub const BEGIN_EXECUTION: &str = "BeginExecution";
pub const COMPLETE_IMPLEMENTATION: &str = "CompleteImplementation";
pub const COMPLETE_REVIEW: &str = "CompleteReview";
pub const COMPLETE_FINALIZE: &str = "CompleteFinalize";

const PLANNING_PROMPT: &str = "Project {{project}} is planning.\n\
Write the task list and register it as a task_list artifact in the planning phase, \
then approve it to continue.";

const IMPLEMENTATION_PLANNING_PROMPT: &str = "Project {{project}} is breaking work into tasks.\n\
{{#if tasks}}Tasks:\n{{tasks}}\n{{/if}}{{#ifnot tasks}}No tasks yet.\n{{/ifnot}}\
Approve the task list to start execution.";

const EXECUTING_PROMPT: &str = "Project {{project}} is executing tasks.\n\
{{#if tasks}}Tasks:\n{{tasks}}\n{{/if}}\
Every task must be completed or abandoned before review.";

const REVIEW_PROMPT: &str = "Project {{project}} is in review.\n\
Add a review artifact and approve it with an assessment of pass or fail.";

const FINALIZE_PROMPT: &str = "Project {{project}} is finalizing.\n\
Run the final checks, then complete the project.";

/// Build the standard workflow
pub fn workflow() -> Result<WorkflowConfig> {
    WorkflowBuilder::new(NAME, PLANNING_ACTIVE)
        .description("Plan, implement, review and finalize a change")
        .phase(PhaseDefinition::artifacts("planning"))
        .phase(
            PhaseDefinition::tasks("implementation")
                .on(PhaseOperation::ApproveTasks, BEGIN_EXECUTION),
        )
        .phase(PhaseDefinition::artifacts("review").disabled())
        .phase(PhaseDefinition::artifacts("finalize").disabled())
        .transition(
            Transition::new(PLANNING_ACTIVE, COMPLETE_PLANNING, IMPLEMENTATION_PLANNING)
                .guard(has_approved_artifact_of_type("planning", "task_list"))
                .on_exit(complete_phase("planning"))
                .on_entry(start_phase("implementation")),
        )
        .transition(
            Transition::new(IMPLEMENTATION_PLANNING, BEGIN_EXECUTION, IMPLEMENTATION_EXECUTING)
                .guard(all_of(vec![
                    min_task_count("implementation", 1),
                    metadata_flag("implementation", TASKS_APPROVED_KEY),
                ])),
        )
        .transition(
            Transition::new(IMPLEMENTATION_EXECUTING, COMPLETE_IMPLEMENTATION, REVIEW_ACTIVE)
                .guard(all_of(vec![
                    min_task_count("implementation", 1),
                    all_tasks_resolved("implementation"),
                    dependencies_valid("implementation"),
                ]))
                .on_exit(complete_phase("implementation"))
                .on_entry(start_phase("review")),
        )
        .transition(
            Transition::new(REVIEW_ACTIVE, COMPLETE_REVIEW, FINALIZE_CHECKS)
                .guard(artifact_assessment("review", "review", "pass"))
                .on_exit(complete_phase("review"))
                .on_entry(start_phase("finalize")),
        )
        .transition(
            Transition::new(REVIEW_ACTIVE, COMPLETE_REVIEW, IMPLEMENTATION_PLANNING)
                .guard(artifact_assessment("review", "review", "fail"))
                .on_entry(chain(vec![
                    reset_phase("implementation", &[TASKS_APPROVED_KEY]),
                    retract_approvals("review", "review"),
                ])),
        )
        .transition(
            Transition::new(FINALIZE_CHECKS, COMPLETE_FINALIZE, COMPLETED)
                .on_exit(complete_phase("finalize")),
        )
        .on_advance(PLANNING_ACTIVE, COMPLETE_PLANNING)
        .on_advance(IMPLEMENTATION_PLANNING, BEGIN_EXECUTION)
        .on_advance(IMPLEMENTATION_EXECUTING, COMPLETE_IMPLEMENTATION)
        .on_advance(REVIEW_ACTIVE, COMPLETE_REVIEW)
        .on_advance(FINALIZE_CHECKS, COMPLETE_FINALIZE)
        .prompt(PLANNING_ACTIVE, PLANNING_PROMPT)
        .prompt(IMPLEMENTATION_PLANNING, IMPLEMENTATION_PLANNING_PROMPT)
        .prompt(IMPLEMENTATION_EXECUTING, EXECUTING_PROMPT)
        .prompt(REVIEW_ACTIVE, REVIEW_PROMPT)
        .prompt(FINALIZE_CHECKS, FINALIZE_PROMPT)
        .initializer(|project| {
            if let Some(planning) = project.phase_mut("planning") {
                planning.advance_status(PhaseStatus::InProgress);
            }
            Ok(())
        })
        .build()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{Machine, PhaseOutcome};
    use crate::errors::{ErrorKind, PhaseflowError};
    use crate::fs::MemoryStore;
    use crate::schemas::{Event, State, TaskStatus};

    fn start(store: &MemoryStore) -> Machine<&MemoryStore> {
        Machine::create(Arc::new(workflow().unwrap()), "auth-rewrite", store).unwrap()
    }

    fn through_planning(machine: &mut Machine<&MemoryStore>) {
        let mut planning = machine.phase("planning").unwrap();
        planning.add_artifact("planning/tasks.md", Some("task_list")).unwrap();
        planning.approve_artifact("planning/tasks.md", None).unwrap();
        machine.fire(&Event::new(COMPLETE_PLANNING)).unwrap();
    }

    fn through_execution(machine: &mut Machine<&MemoryStore>) {
        through_planning(machine);
        {
            let mut implementation = machine.phase("implementation").unwrap();
            implementation.add_task("001", "Schema", &[]).unwrap();
            implementation.add_task("002", "Handlers", &["001"]).unwrap();
        }
        let outcome = machine.phase("implementation").unwrap().approve_tasks().unwrap();
        machine.apply(outcome).unwrap();
        let mut implementation = machine.phase("implementation").unwrap();
        implementation.set_task_status("001", TaskStatus::Completed).unwrap();
        implementation.set_task_status("002", TaskStatus::Completed).unwrap();
        machine.fire(&Event::new(COMPLETE_IMPLEMENTATION)).unwrap();
    }

    fn review(machine: &mut Machine<&MemoryStore>, path: &str, assessment: &str) {
        let mut review = machine.phase("review").unwrap();
        review.add_artifact(path, Some("review")).unwrap();
        review.approve_artifact(path, Some(assessment)).unwrap();
        machine.fire(&Event::new(COMPLETE_REVIEW)).unwrap();
    }

    #[test]
    fn test_workflow_builds() {
        let config = workflow().unwrap();
        assert_eq!(config.name(), NAME);
        assert_eq!(config.table().states().len(), 6);
        assert!(config.prompt(&State::new(REVIEW_ACTIVE)).is_some());
    }

    #[test]
    fn test_new_project_starts_planning() {
        let store = MemoryStore::new();
        let machine = start(&store);
        let planning = machine.project().phase("planning").unwrap();
        assert_eq!(planning.status, PhaseStatus::InProgress);
        assert!(!machine.project().phase("review").unwrap().enabled);
    }

    #[test]
    fn test_complete_planning_requires_approved_task_list() {
        let store = MemoryStore::new();
        let mut machine = start(&store);

        let err = machine.fire(&Event::new(COMPLETE_PLANNING)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CannotAdvance);
        assert!(err.to_string().contains("task_list artifact not approved"));
        assert_eq!(machine.state(), &State::new(PLANNING_ACTIVE));

        let mut planning = machine.phase("planning").unwrap();
        planning.add_artifact("planning/tasks.md", Some("task_list")).unwrap();
        planning.approve_artifact("planning/tasks.md", None).unwrap();
        machine.fire(&Event::new(COMPLETE_PLANNING)).unwrap();

        assert_eq!(machine.state(), &State::new(IMPLEMENTATION_PLANNING));
        let project = machine.project();
        assert_eq!(project.phase("planning").unwrap().status, PhaseStatus::Completed);
        assert_eq!(
            project.phase("implementation").unwrap().status,
            PhaseStatus::InProgress
        );
    }

    #[test]
    fn test_approve_tasks_returns_begin_execution() {
        let store = MemoryStore::new();
        let mut machine = start(&store);
        through_planning(&mut machine);

        let outcome = machine.phase("implementation").unwrap().approve_tasks().unwrap();
        assert_eq!(outcome, PhaseOutcome::Fire(Event::new(BEGIN_EXECUTION)));

        // no tasks yet, so the guard still blocks
        let err = machine.apply(outcome).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_pending_task_blocks_review() {
        let store = MemoryStore::new();
        let mut machine = start(&store);
        through_planning(&mut machine);
        machine.phase("implementation").unwrap().add_task("001", "Schema", &[]).unwrap();
        machine.phase("implementation").unwrap().add_task("002", "Docs", &[]).unwrap();
        let outcome = machine.phase("implementation").unwrap().approve_tasks().unwrap();
        machine.apply(outcome).unwrap();
        machine
            .phase("implementation")
            .unwrap()
            .set_task_status("001", TaskStatus::Completed)
            .unwrap();

        let event = Event::new(COMPLETE_IMPLEMENTATION);
        assert!(!machine.can_fire(&event).unwrap());

        machine
            .phase("implementation")
            .unwrap()
            .set_task_status("002", TaskStatus::Abandoned)
            .unwrap();
        assert!(machine.can_fire(&event).unwrap());
    }

    #[test]
    fn test_dangling_dependency_blocks_review() {
        let store = MemoryStore::new();
        let mut machine = start(&store);
        through_planning(&mut machine);
        machine
            .phase("implementation")
            .unwrap()
            .add_task("001", "Schema", &["999"])
            .unwrap();
        let outcome = machine.phase("implementation").unwrap().approve_tasks().unwrap();
        machine.apply(outcome).unwrap();
        machine
            .phase("implementation")
            .unwrap()
            .set_task_status("001", TaskStatus::Completed)
            .unwrap();

        let err = machine.fire(&Event::new(COMPLETE_IMPLEMENTATION)).unwrap_err();
        assert!(matches!(err, PhaseflowError::CannotAdvance { .. }));
        assert!(err.to_string().contains("999"));
    }

    #[test]
    fn test_review_pass_reaches_completed() {
        let store = MemoryStore::new();
        let mut machine = start(&store);
        through_execution(&mut machine);
        assert_eq!(machine.state(), &State::new(REVIEW_ACTIVE));

        review(&mut machine, "review/1.md", "pass");
        assert_eq!(machine.state(), &State::new(FINALIZE_CHECKS));

        assert_eq!(machine.advance().unwrap(), &State::new(COMPLETED));
        let project = machine.project();
        for phase in ["planning", "implementation", "review", "finalize"] {
            assert_eq!(project.phase(phase).unwrap().status, PhaseStatus::Completed, "{}", phase);
        }
        assert_eq!(store.snapshot().unwrap().state, COMPLETED);
    }

    #[test]
    fn test_review_fail_loops_back() {
        let store = MemoryStore::new();
        let mut machine = start(&store);
        through_execution(&mut machine);

        review(&mut machine, "review/1.md", "fail");
        assert_eq!(machine.state(), &State::new(IMPLEMENTATION_PLANNING));
        let implementation = machine.project().phase("implementation").unwrap();
        assert_eq!(implementation.status, PhaseStatus::InProgress);
        assert!(!implementation.flag(TASKS_APPROVED_KEY));

        machine.phase("implementation").unwrap().add_task("003", "Fix review findings", &["002"]).unwrap();
        let outcome = machine.phase("implementation").unwrap().approve_tasks().unwrap();
        machine.apply(outcome).unwrap();
        machine
            .phase("implementation")
            .unwrap()
            .set_task_status("003", TaskStatus::Completed)
            .unwrap();
        machine.fire(&Event::new(COMPLETE_IMPLEMENTATION)).unwrap();

        review(&mut machine, "review/2.md", "pass");
        assert_eq!(machine.state(), &State::new(FINALIZE_CHECKS));
    }

    #[test]
    fn test_second_review_needs_a_fresh_verdict() {
        let store = MemoryStore::new();
        let mut machine = start(&store);
        through_execution(&mut machine);
        review(&mut machine, "review/1.md", "fail");

        let first = machine.project().phase("review").unwrap().artifact("review/1.md").unwrap();
        assert!(!first.approved);
        assert_eq!(first.assessment.as_deref(), Some("fail"));

        let outcome = machine.phase("implementation").unwrap().approve_tasks().unwrap();
        machine.apply(outcome).unwrap();
        machine.fire(&Event::new(COMPLETE_IMPLEMENTATION)).unwrap();
        assert_eq!(machine.state(), &State::new(REVIEW_ACTIVE));

        let err = machine.advance().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CannotAdvance);
        assert_eq!(machine.state(), &State::new(REVIEW_ACTIVE));

        // re-approving the old review counts as a new verdict
        machine
            .phase("review")
            .unwrap()
            .approve_artifact("review/1.md", Some("pass"))
            .unwrap();
        assert_eq!(machine.advance().unwrap(), &State::new(FINALIZE_CHECKS));
    }

    #[test]
    fn test_skipped_planning_can_still_complete() {
        let store = MemoryStore::new();
        let mut machine = start(&store);
        let mut planning = machine.phase("planning").unwrap();
        planning.add_artifact("planning/tasks.md", Some("task_list")).unwrap();
        planning.approve_artifact("planning/tasks.md", None).unwrap();
        planning.skip().unwrap();

        let event = Event::new(COMPLETE_PLANNING);
        assert!(machine.can_fire(&event).unwrap());
        machine.fire(&event).unwrap();

        assert_eq!(machine.state(), &State::new(IMPLEMENTATION_PLANNING));
        assert_eq!(
            machine.project().phase("planning").unwrap().status,
            PhaseStatus::Skipped
        );
    }

    #[test]
    fn test_skipped_review_is_entered_without_reopening() {
        let store = MemoryStore::new();
        let mut machine = start(&store);
        {
            let mut review = machine.phase("review").unwrap();
            review.enable().unwrap();
            review.skip().unwrap();
        }
        through_execution(&mut machine);

        assert_eq!(machine.state(), &State::new(REVIEW_ACTIVE));
        assert_eq!(
            machine.project().phase("review").unwrap().status,
            PhaseStatus::Skipped
        );
    }

    #[test]
    fn test_review_without_assessment_cannot_advance() {
        let store = MemoryStore::new();
        let mut machine = start(&store);
        through_execution(&mut machine);

        let mut phase = machine.phase("review").unwrap();
        phase.add_artifact("review/1.md", Some("review")).unwrap();
        phase.approve_artifact("review/1.md", None).unwrap();

        let err = machine.advance().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CannotAdvance);
        assert_eq!(machine.state(), &State::new(REVIEW_ACTIVE));
    }

    #[test]
    fn test_resume_after_interruption() {
        let store = MemoryStore::new();
        {
            let mut machine = start(&store);
            through_planning(&mut machine);
        }
        let machine = Machine::resume(Arc::new(workflow().unwrap()), &store).unwrap();
        assert_eq!(machine.state(), &State::new(IMPLEMENTATION_PLANNING));
    }
}
