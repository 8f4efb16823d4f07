//! Configuration loading with defaults

use std::path::Path;

use crate::errors::{PhaseflowError, Result};
use crate::fs::{get_config_path, read_json};
use crate::schemas::Config;

/// Load configuration for a project root, falling back to defaults.
///
/// Fields missing from config.json take their default values. A missing
/// file yields the default configuration.
///
/// # Errors
/// * `InvalidJson` - config.json exists but does not parse
/// * `ConfigError` - the state file name is empty or escapes `.phaseflow`
pub fn load_config(root: &Path) -> Result<Config> {
    let path = get_config_path(root);
    if !path.exists() {
        return Ok(Config::default());
    }
    let config: Config = read_json(&path)?;
    validate(&config)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let name = config.state_file.trim();
    if name.is_empty() {
        return Err(PhaseflowError::ConfigError("state_file must not be empty".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name == ".." {
        return Err(PhaseflowError::ConfigError(format!(
            "state_file {} must be a plain file name",
            name
        )));
    }
    Ok(())
}
