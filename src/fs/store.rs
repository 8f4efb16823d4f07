//! Persistence collaborators for the project record

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use crate::errors::{PhaseflowError, Result};
use crate::schemas::{ProjectState, SCHEMA_VERSION};

use super::json::{read_json, write_json};

/// Loads and saves the project record.
///
/// `save` is expected to be atomic: after a crash the old or the new record
/// is intact, never a partial one.
pub trait StateStore {
    fn load(&self) -> Result<ProjectState>;
    fn save(&self, project: &ProjectState) -> Result<()>;
}

/// Stores the record as pretty-printed JSON at a fixed path
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl StateStore for JsonFileStore {
    /// # Errors
    /// * `FileNotFound` - no record at the path
    /// * `InvalidJson` - the file does not parse as a record
    /// * `SchemaValidation` - the record was written by a newer layout
    fn load(&self) -> Result<ProjectState> {
        let project: ProjectState = read_json(&self.path)?;
        if project.schema_version > SCHEMA_VERSION {
            return Err(PhaseflowError::SchemaValidation(format!(
                "{} uses schema version {}, this build understands up to {}",
                self.path.display(),
                project.schema_version,
                SCHEMA_VERSION
            )));
        }
        Ok(project)
    }

    fn save(&self, project: &ProjectState) -> Result<()> {
        tracing::debug!(path = %self.path.display(), state = %project.state, "saving project");
        write_json(&self.path, project)
    }
}

/// Keeps the record in memory; useful for hosts that persist elsewhere
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: RefCell<Option<ProjectState>>,
    saves: Cell<usize>,
    fail_saves: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with `project`
    pub fn with_project(project: ProjectState) -> Self {
        let store = Self::default();
        store.record.replace(Some(project));
        store
    }

    /// Make subsequent saves fail with an IO error
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// The last saved record
    pub fn snapshot(&self) -> Option<ProjectState> {
        self.record.borrow().clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<ProjectState> {
        self.record
            .borrow()
            .clone()
            .ok_or_else(|| PhaseflowError::FileNotFound("no project stored in memory".to_string()))
    }

    fn save(&self, project: &ProjectState) -> Result<()> {
        if self.fail_saves.get() {
            return Err(PhaseflowError::Io(std::io::Error::other(
                "memory store rejected the write",
            )));
        }
        self.record.replace(Some(project.clone()));
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

impl<T: StateStore + ?Sized> StateStore for &T {
    fn load(&self) -> Result<ProjectState> {
        (**self).load()
    }

    fn save(&self, project: &ProjectState) -> Result<()> {
        (**self).save(project)
    }
}
