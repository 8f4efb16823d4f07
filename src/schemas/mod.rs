//! Schema types for phaseflow
//!
//! These are the shapes that get persisted as JSON.

mod config;
mod phase;
mod project;
mod state;

pub use config::Config;
pub use phase::{Artifact, PhaseRecord, PhaseStatus, Task, TaskStatus, DEPENDENCIES_KEY};
pub use project::{ProjectState, SCHEMA_VERSION};
pub use state::{Event, State};
