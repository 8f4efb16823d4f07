//! Dependency validation for a phase's task list
//!
//! Only completed tasks have their declared dependencies checked, so draft
//! and abandoned entries never block a phase.

use std::collections::{HashMap, HashSet};

use crate::schemas::{Task, TaskStatus};

/// The first problem found in a task dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyViolation {
    /// A completed task depends on an id that is not in the phase
    Dangling { task: String, missing: String },
    /// A completed task lists itself as a dependency
    SelfReference { task: String },
    /// Following dependencies from `task` leads back to `task`
    Cycle { task: String, via: String },
}

impl std::fmt::Display for DependencyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyViolation::Dangling { task, missing } => {
                write!(f, "task {} depends on unknown task {}", task, missing)
            }
            DependencyViolation::SelfReference { task } => {
                write!(f, "task {} depends on itself", task)
            }
            DependencyViolation::Cycle { task, via } => {
                write!(f, "dependency cycle through task {} back to {}", via, task)
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Validate the dependency graph of a task collection.
///
/// Checks, in order: dangling references, self references, then cycles
/// across the subgraph of completed tasks.
pub fn validate_dependencies(tasks: &[Task]) -> Result<(), DependencyViolation> {
    let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();

    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in tasks.iter().filter(|t| t.status == TaskStatus::Completed) {
        let deps = task.dependencies();
        for dep in &deps {
            if *dep == task.id {
                return Err(DependencyViolation::SelfReference {
                    task: task.id.clone(),
                });
            }
            if !ids.contains(dep) {
                return Err(DependencyViolation::Dangling {
                    task: task.id.clone(),
                    missing: dep.to_string(),
                });
            }
        }
        edges.insert(task.id.as_str(), deps);
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    for task in tasks.iter().filter(|t| t.status == TaskStatus::Completed) {
        let root = task.id.as_str();
        if marks.contains_key(root) {
            continue;
        }

        marks.insert(root, Mark::InProgress);
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            let deps = edges.get(node).map(Vec::as_slice).unwrap_or(&[]);

            if next >= deps.len() {
                marks.insert(node, Mark::Done);
                stack.pop();
                continue;
            }

            top.1 += 1;
            let dep = deps[next];
            match marks.get(dep) {
                Some(Mark::InProgress) => {
                    return Err(DependencyViolation::Cycle {
                        task: dep.to_string(),
                        via: node.to_string(),
                    });
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(dep, Mark::InProgress);
                    stack.push((dep, 0));
                }
            }
        }
    }

    Ok(())
}
