//! Property-based tests for the workflow engine
//!
//! These tests use proptest to check engine invariants over random event
//! sequences and random task graphs.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use serde_json::Value;

    use crate::domain::actions::start_phase;
    use crate::domain::guards::metadata_flag;
    use crate::domain::{
        validate_dependencies, Action, Machine, PhaseDefinition, Transition, WorkflowBuilder,
        WorkflowConfig,
    };
    use crate::errors::PhaseflowError;
    use crate::fs::MemoryStore;
    use crate::schemas::{Event, PhaseStatus, ProjectState, Task, TaskStatus};

    const EVENTS: [&str; 5] = ["go", "back", "finish", "explode", "unknown"];

    #[derive(Debug, Clone)]
    enum Op {
        SetReady(bool),
        Fire(usize),
        Approve,
    }

    // ===== STRATEGY HELPERS =====

    fn any_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::SetReady),
            (0..EVENTS.len()).prop_map(Op::Fire),
            Just(Op::Approve),
        ]
    }

    fn any_task_status() -> impl Strategy<Value = TaskStatus> {
        prop_oneof![
            Just(TaskStatus::Pending),
            Just(TaskStatus::InProgress),
            Just(TaskStatus::NeedsReview),
            Just(TaskStatus::Completed),
            Just(TaskStatus::Abandoned),
        ]
    }

    fn workflow() -> Arc<WorkflowConfig> {
        let config = WorkflowBuilder::new("prop", "A")
            .phase(PhaseDefinition::tasks("work"))
            .phase(PhaseDefinition::artifacts("notes").disabled())
            .transition(Transition::new("A", "go", "B").guard(metadata_flag("work", "ready")))
            .transition(Transition::new("B", "back", "A"))
            .transition(Transition::new("B", "finish", "C").on_entry(start_phase("notes")))
            .transition(Transition::new("C", "explode", "D").on_entry(Action::new(
                "refuse",
                |project| {
                    project.description = Some("half done".to_string());
                    Err(PhaseflowError::Action("refused".to_string()))
                },
            )))
            .build()
            .unwrap();
        Arc::new(config)
    }

    /// Apply `op`, returning whether it succeeded
    fn apply(machine: &mut Machine<&MemoryStore>, op: &Op) -> bool {
        match op {
            Op::SetReady(ready) => machine
                .phase("work")
                .unwrap()
                .set_metadata("ready", Value::Bool(*ready))
                .is_ok(),
            Op::Fire(i) => machine.fire(&Event::new(EVENTS[*i])).is_ok(),
            Op::Approve => {
                let mut notes = machine.phase("notes").unwrap();
                let _ = notes.add_artifact("n.md", None);
                notes.approve_artifact("n.md", None).is_ok()
            }
        }
    }

    /// Everything in the record except timestamps
    fn shape(project: &ProjectState) -> (String, Vec<(String, PhaseStatus, bool, usize)>) {
        let phases = project
            .phases
            .iter()
            .map(|(name, record)| {
                (
                    name.clone(),
                    record.status,
                    record.flag("ready"),
                    record.artifacts.iter().filter(|a| a.approved).count(),
                )
            })
            .collect();
        (project.state.to_string(), phases)
    }

    proptest! {
        #[test]
        fn prop_fire_is_deterministic(ops in prop::collection::vec(any_op(), 0..30)) {
            let (left, right) = (MemoryStore::new(), MemoryStore::new());
            let mut a = Machine::create(workflow(), "p", &left).unwrap();
            let mut b = Machine::create(workflow(), "p", &right).unwrap();

            for op in &ops {
                let ok_a = apply(&mut a, op);
                let ok_b = apply(&mut b, op);
                prop_assert_eq!(ok_a, ok_b);
                prop_assert_eq!(shape(a.project()), shape(b.project()));
            }
        }

        #[test]
        fn prop_failed_fire_changes_nothing(ops in prop::collection::vec(any_op(), 0..30)) {
            let store = MemoryStore::new();
            let mut machine = Machine::create(workflow(), "p", &store).unwrap();

            for op in &ops {
                if let Op::Fire(i) = op {
                    let before = machine.project().clone();
                    let saves = store.save_count();
                    if machine.fire(&Event::new(EVENTS[*i])).is_err() {
                        prop_assert_eq!(machine.project(), &before);
                        prop_assert_eq!(store.save_count(), saves);
                    }
                } else {
                    apply(&mut machine, op);
                }
            }
        }

        #[test]
        fn prop_state_is_always_known(ops in prop::collection::vec(any_op(), 0..30)) {
            let store = MemoryStore::new();
            let mut machine = Machine::create(workflow(), "p", &store).unwrap();
            for op in &ops {
                apply(&mut machine, op);
                prop_assert!(machine.config().table().contains_state(machine.state()));
                prop_assert_eq!(&store.snapshot().unwrap().state, machine.state());
            }
        }

        #[test]
        fn prop_approval_is_idempotent(times in 1usize..5) {
            let store = MemoryStore::new();
            let mut machine = Machine::create(workflow(), "p", &store).unwrap();
            machine.phase("work").unwrap().set_metadata("ready", Value::Bool(true)).unwrap();
            machine.fire(&Event::new("go")).unwrap();
            machine.fire(&Event::new("finish")).unwrap();
            machine.phase("notes").unwrap().add_artifact("n.md", Some("note")).unwrap();

            machine.phase("notes").unwrap().approve_artifact("n.md", None).unwrap();
            let once = shape(machine.project());
            for _ in 0..times {
                machine.phase("notes").unwrap().approve_artifact("n.md", None).unwrap();
            }
            prop_assert_eq!(shape(machine.project()), once);
        }

        #[test]
        fn prop_completed_chain_is_valid(n in 1usize..20) {
            let tasks: Vec<Task> = (0..n)
                .map(|i| {
                    let task = Task::new(format!("{:03}", i), format!("Task {}", i))
                        .with_status(TaskStatus::Completed);
                    if i == 0 {
                        task
                    } else {
                        let prev = format!("{:03}", i - 1);
                        task.with_dependencies(&[prev.as_str()])
                    }
                })
                .collect();
            prop_assert!(validate_dependencies(&tasks).is_ok());
        }

        #[test]
        fn prop_closing_a_chain_is_a_cycle(n in 2usize..20) {
            let tasks: Vec<Task> = (0..n)
                .map(|i| {
                    let prev = format!("{:03}", (i + n - 1) % n);
                    Task::new(format!("{:03}", i), format!("Task {}", i))
                        .with_status(TaskStatus::Completed)
                        .with_dependencies(&[prev.as_str()])
                })
                .collect();
            prop_assert!(validate_dependencies(&tasks).is_err());
        }

        #[test]
        fn prop_unfinished_tasks_never_violate(
            statuses in prop::collection::vec(any_task_status(), 1..10),
            edges in prop::collection::vec((0usize..10, 0usize..12), 0..20),
        ) {
            let n = statuses.len();
            let tasks: Vec<Task> = statuses
                .iter()
                .enumerate()
                .map(|(i, status)| {
                    let deps: Vec<String> = edges
                        .iter()
                        .filter(|(from, _)| *from == i)
                        .map(|(_, to)| format!("{:03}", to))
                        .collect();
                    let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
                    let status = if *status == TaskStatus::Completed {
                        TaskStatus::Pending
                    } else {
                        *status
                    };
                    Task::new(format!("{:03}", i), format!("Task {}", i))
                        .with_status(status)
                        .with_dependencies(&deps)
                })
                .collect();
            prop_assert_eq!(tasks.len(), n);
            prop_assert!(validate_dependencies(&tasks).is_ok());
        }
    }
}
