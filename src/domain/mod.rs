//! Workflow engine: transition table, guards, machine, phases and builder

pub mod actions;
mod builder;
mod dependencies;
pub mod guards;
mod machine;
mod phase;
mod registry;
mod transitions;

// Property-based tests (compiled only in test builds)
#[cfg(test)]
mod property_tests;

pub use builder::{PhaseDefinition, PhaseOperation, PhaseShape, WorkflowBuilder, WorkflowConfig};
pub use dependencies::{validate_dependencies, DependencyViolation};
pub use guards::{Guard, GuardResult};
pub use machine::Machine;
pub use phase::{Phase, PhaseOutcome, TASKS_APPROVED_KEY};
pub use registry::WorkflowRegistry;
pub use transitions::{Action, Selection, Transition, TransitionTable};
