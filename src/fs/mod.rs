//! File system utilities for phaseflow
//!
//! Provides path resolution, JSON file operations and the persistence hook.

mod json;
mod paths;
mod store;

pub use json::{read_json, write_json};
pub use paths::{
    find_project_root, get_config_path, get_phaseflow_dir, get_prompts_dir, get_state_path,
    resolve_cwd,
};
pub use store::{JsonFileStore, MemoryStore, StateStore};
