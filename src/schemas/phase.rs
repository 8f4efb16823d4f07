//! Phase schema - per-phase status, artifacts and tasks

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata key holding a task's dependency list
pub const DEPENDENCIES_KEY: &str = "dependencies";

/// Lifecycle status of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl PhaseStatus {
    fn rank(self) -> u8 {
        match self {
            PhaseStatus::Pending => 0,
            PhaseStatus::InProgress => 1,
            PhaseStatus::Completed | PhaseStatus::Skipped => 2,
        }
    }

    /// Whether moving to `next` keeps the status moving forward
    pub fn can_move_to(self, next: PhaseStatus) -> bool {
        if self == next {
            return true;
        }
        next.rank() > self.rank()
    }

    pub fn is_finished(self) -> bool {
        matches!(self, PhaseStatus::Completed | PhaseStatus::Skipped)
    }
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseStatus::Pending => write!(f, "pending"),
            PhaseStatus::InProgress => write!(f, "in_progress"),
            PhaseStatus::Completed => write!(f, "completed"),
            PhaseStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Status of a task within a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    NeedsReview,
    Completed,
    Abandoned,
}

impl TaskStatus {
    /// Completed or abandoned
    pub fn is_resolved(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Abandoned)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::NeedsReview => write!(f, "needs_review"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Abandoned => write!(f, "abandoned"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "needs_review" => Ok(TaskStatus::NeedsReview),
            "completed" => Ok(TaskStatus::Completed),
            "abandoned" => Ok(TaskStatus::Abandoned),
            _ => Err(format!("Unknown task status: {}", s)),
        }
    }
}

/// A reviewable output document tracked by path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Path of the document, unique within its phase
    pub path: String,

    /// Optional artifact type (e.g. "task_list", "review")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,

    /// Whether a human approved the artifact
    #[serde(default)]
    pub approved: bool,

    /// Optional assessment recorded at approval time (e.g. "pass")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<String>,

    /// ISO 8601 creation timestamp
    pub created_at: String,
}

impl Artifact {
    pub fn new(path: String, artifact_type: Option<String>) -> Self {
        Artifact {
            path,
            artifact_type,
            approved: false,
            assessment: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_type(&self, artifact_type: &str) -> bool {
        self.artifact_type.as_deref() == Some(artifact_type)
    }
}

/// A unit of work tracked by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier, unique within its phase
    pub id: String,

    /// Human-readable name
    pub name: String,

    #[serde(default)]
    pub status: TaskStatus,

    /// Open metadata; `dependencies` holds sibling task ids
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,

    /// ISO 8601 last update timestamp
    pub updated_at: String,
}

impl Task {
    pub fn new(id: String, name: String) -> Self {
        Task {
            id,
            name,
            status: TaskStatus::Pending,
            metadata: BTreeMap::new(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Return a new Task with the given dependency ids
    pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
        let list = dependencies.iter().map(|d| Value::from(*d)).collect();
        self.metadata
            .insert(DEPENDENCIES_KEY.to_string(), Value::Array(list));
        self
    }

    /// Return a new Task with the given status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Declared dependency ids. Entries that are not strings are skipped.
    pub fn dependencies(&self) -> Vec<&str> {
        match self.metadata.get(DEPENDENCIES_KEY) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Persisted record of one phase.
///
/// Every workflow uses this one shape; a phase definition decides whether
/// the artifact or the task collection is in play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PhaseRecord {
    #[serde(default)]
    pub status: PhaseStatus,

    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,

    #[serde(default)]
    pub artifacts: Vec<Artifact>,

    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl PhaseRecord {
    pub fn new(enabled: bool) -> Self {
        PhaseRecord {
            enabled,
            ..Default::default()
        }
    }

    pub fn artifact(&self, path: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.path == path)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Boolean metadata flag; anything other than `true` reads as false
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.metadata.get(key), Some(Value::Bool(true)))
    }

    /// Move the status forward, stamping timestamps on the way.
    ///
    /// Returns false when the move would go backwards.
    pub fn advance_status(&mut self, next: PhaseStatus) -> bool {
        if !self.status.can_move_to(next) {
            return false;
        }
        let now = chrono::Utc::now().to_rfc3339();
        if next != PhaseStatus::Pending && self.started_at.is_none() {
            self.started_at = Some(now.clone());
        }
        if next.is_finished() && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.status = next;
        true
    }

    /// Reopen a phase for another pass, as a review loop-back does
    pub fn reset(&mut self) {
        self.status = PhaseStatus::InProgress;
        self.completed_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&PhaseStatus::InProgress).unwrap(), "\"in_progress\"");
        assert_eq!(serde_json::to_string(&TaskStatus::NeedsReview).unwrap(), "\"needs_review\"");
    }

    #[test]
    fn test_phase_status_moves_forward_only() {
        assert!(PhaseStatus::Pending.can_move_to(PhaseStatus::InProgress));
        assert!(PhaseStatus::Pending.can_move_to(PhaseStatus::Skipped));
        assert!(PhaseStatus::InProgress.can_move_to(PhaseStatus::Completed));
        assert!(!PhaseStatus::Completed.can_move_to(PhaseStatus::InProgress));
        assert!(!PhaseStatus::Skipped.can_move_to(PhaseStatus::Completed));
    }

    #[test]
    fn test_advance_status_stamps_timestamps() {
        let mut phase = PhaseRecord::new(true);
        assert!(phase.advance_status(PhaseStatus::InProgress));
        assert!(phase.started_at.is_some());
        assert!(phase.completed_at.is_none());

        assert!(phase.advance_status(PhaseStatus::Completed));
        assert!(phase.completed_at.is_some());
        assert!(!phase.advance_status(PhaseStatus::Pending));
    }

    #[test]
    fn test_reset_reopens_phase() {
        let mut phase = PhaseRecord::new(true);
        phase.advance_status(PhaseStatus::Completed);
        phase.reset();
        assert_eq!(phase.status, PhaseStatus::InProgress);
        assert!(phase.completed_at.is_none());
        assert!(phase.started_at.is_some());
    }

    #[test]
    fn test_task_dependencies_skip_non_strings() {
        let mut task = Task::new("003".to_string(), "Wire up".to_string());
        task.metadata.insert(
            DEPENDENCIES_KEY.to_string(),
            serde_json::json!(["001", 7, null, "002", {"id": "x"}]),
        );
        assert_eq!(task.dependencies(), vec!["001", "002"]);
    }

    #[test]
    fn test_task_dependencies_absent_or_malformed() {
        let mut task = Task::new("001".to_string(), "Start".to_string());
        assert!(task.dependencies().is_empty());

        task.metadata
            .insert(DEPENDENCIES_KEY.to_string(), Value::String("002".to_string()));
        assert!(task.dependencies().is_empty());
    }

    #[test]
    fn test_artifact_type_field_name() {
        let artifact = Artifact::new("planning/tasks.md".to_string(), Some("task_list".to_string()));
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["type"], "task_list");
        assert_eq!(json["approved"], false);
        assert!(json.get("assessment").is_none());
    }

    #[test]
    fn test_flag_reads_only_true() {
        let mut phase = PhaseRecord::new(true);
        assert!(!phase.flag("tasks_approved"));
        phase.metadata.insert("tasks_approved".to_string(), Value::String("yes".into()));
        assert!(!phase.flag("tasks_approved"));
        phase.metadata.insert("tasks_approved".to_string(), Value::Bool(true));
        assert!(phase.flag("tasks_approved"));
    }
}
