//! JSON file operations
//!
//! Backs record and config persistence. Writes go to a temp file in the
//! target directory, are synced, then renamed over the target, so a reader
//! sees either the old record or the new one and never a partial write.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{PhaseflowError, Result};

/// Read and deserialize a JSON file.
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidJson` - If the file is not valid JSON for `T`
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PhaseflowError::FileNotFound(format!("File not found: {}", path.display()))
        } else {
            PhaseflowError::Io(e)
        }
    })?;

    serde_json::from_str(&content).map_err(|e| {
        PhaseflowError::InvalidJson(format!("Invalid JSON in file {}: {}", path.display(), e))
    })
}

/// Write a value to a JSON file with pretty formatting.
///
/// Writes to a sibling temp file, syncs it, then renames it over `path`,
/// so readers see either the old or the new content.
///
/// # Errors
/// * `Io` - If there's an error writing the file
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(data)
        .map_err(|e| PhaseflowError::InvalidJson(e.to_string()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::Config;
    use tempfile::TempDir;

    #[test]
    fn test_read_json_file_not_found() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.json");

        let result: Result<Config> = read_json(&path);
        assert!(matches!(result.unwrap_err(), PhaseflowError::FileNotFound(_)));
    }

    #[test]
    fn test_read_json_invalid_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("invalid.json");
        fs::write(&path, "not valid json {").unwrap();

        let result: Result<Config> = read_json(&path);
        assert!(matches!(result.unwrap_err(), PhaseflowError::InvalidJson(_)));
    }

    #[test]
    fn test_write_json_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("dir").join("config.json");

        write_json(&path, &Config::default()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let read: Config = read_json(&path).unwrap();
        assert_eq!(read.state_file, "project.json");
    }

    #[test]
    fn test_write_json_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "stale").unwrap();

        let mut config = Config::default();
        config.default_project_type = "exploration".to_string();
        write_json(&path, &config).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("}\n"));
        let read: Config = read_json(&path).unwrap();
        assert_eq!(read.default_project_type, "exploration");
    }
}
