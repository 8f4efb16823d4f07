//! Phaseflow - a phased workflow state machine for project records
//!
//! This library provides:
//! - Schema definitions for the persisted project record and configuration
//! - The workflow engine: transition table, guards, machine, phases and builder
//! - File system utilities and the persistence hook
//! - Built-in workflows and status prompt rendering

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fs;
pub mod prompts;
pub mod schemas;
pub mod workflows;

// Re-export commonly used types
pub use domain::{Machine, PhaseOutcome, WorkflowBuilder, WorkflowConfig, WorkflowRegistry};
pub use errors::{ErrorKind, PhaseflowError, Result};
pub use schemas::{Config, Event, PhaseRecord, ProjectState, State};
