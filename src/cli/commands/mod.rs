//! CLI command implementations

pub mod artifact;
pub mod context;
pub mod events;
pub mod init;
pub mod phase;
pub mod status;
pub mod task;
pub mod workflows;
