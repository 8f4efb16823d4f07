//! Path resolution utilities for phaseflow
//!
//! Locates the project root and builds paths to files under `.phaseflow`.

use std::path::{Path, PathBuf};

use crate::errors::{PhaseflowError, Result};
use crate::schemas::Config;

const PHASEFLOW_DIR: &str = ".phaseflow";

/// Find the nearest directory containing `.phaseflow`.
///
/// Walks up the directory tree from `start_cwd`.
///
/// # Errors
/// * `ProjectNotFound` - If no ancestor holds a `.phaseflow` directory
pub fn find_project_root(start_cwd: &Path) -> Result<PathBuf> {
    let mut current = start_cwd
        .canonicalize()
        .map_err(|e| PhaseflowError::ProjectNotFound(format!("Cannot resolve path: {}", e)))?;

    loop {
        if current.join(PHASEFLOW_DIR).is_dir() {
            return Ok(current);
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent.to_path_buf();
            }
            _ => {
                return Err(PhaseflowError::ProjectNotFound(
                    "Could not find a directory containing .phaseflow; run `phaseflow init` first"
                        .to_string(),
                ));
            }
        }
    }
}

/// Resolve the current working directory, optionally using an override.
pub fn resolve_cwd(cwd_option: Option<&Path>) -> PathBuf {
    match cwd_option {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Get the path to the .phaseflow directory.
pub fn get_phaseflow_dir(root: &Path) -> PathBuf {
    root.join(PHASEFLOW_DIR)
}

/// Get the path to the config.json file.
pub fn get_config_path(root: &Path) -> PathBuf {
    get_phaseflow_dir(root).join("config.json")
}

/// Get the path to the project record named by the config.
pub fn get_state_path(root: &Path, config: &Config) -> PathBuf {
    get_phaseflow_dir(root).join(&config.state_file)
}

/// Get the prompts directory; `prompts_dir` overrides are relative to the root.
pub fn get_prompts_dir(root: &Path, config: &Config) -> PathBuf {
    match &config.prompts_dir {
        Some(dir) => root.join(dir),
        None => get_phaseflow_dir(root).join("prompts"),
    }
}
