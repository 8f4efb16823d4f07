//! Error types for phaseflow
//!
//! Each error has a stable code and a coarse [`ErrorKind`] so callers can
//! classify failures without parsing messages.

use thiserror::Error;

/// Result type alias for phaseflow operations
pub type Result<T> = std::result::Result<T, PhaseflowError>;

/// Coarse classification of engine failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Event is not registered for the current state
    UnexpectedState,
    /// Event is registered but no guard is satisfied
    CannotAdvance,
    /// Operation does not apply to this phase or state
    NotSupported,
    /// Workflow configuration is invalid (build time only)
    Validation,
    /// Input was malformed, or referenced something missing or already present
    Data,
    /// Storage, parsing and other passthrough failures
    Io,
}

/// Main error type for all phaseflow operations
#[derive(Debug, Error)]
pub enum PhaseflowError {
    /// Event is not valid from the current state
    #[error("Unexpected state: event '{event}' is not valid in state '{state}'")]
    UnexpectedState { state: String, event: String },

    /// Event is valid here but its prerequisites are not met
    #[error("Cannot advance from '{state}' on '{event}': {reason}")]
    CannotAdvance {
        state: String,
        event: String,
        reason: String,
    },

    /// Operation is not available for this phase shape or state
    #[error("Operation '{operation}' is not supported by {target}")]
    NotSupported { operation: String, target: String },

    /// Invalid workflow configuration, raised while building a workflow
    #[error("Workflow validation failed: {0}")]
    Validation(String),

    /// A value supplied by the caller could not be parsed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Referenced phase, task or artifact does not exist
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// A task id or artifact path is already present in the phase
    #[error("{kind} already exists: {key}")]
    Duplicate { kind: &'static str, key: String },

    /// A phase status change that would move backwards
    #[error("Phase '{phase}' cannot move from {from} to {to}")]
    PhaseStatus {
        phase: String,
        from: String,
        to: String,
    },

    /// An entry or exit action refused the transition
    #[error("Transition action failed: {0}")]
    Action(String),

    /// The state changed in memory but could not be written out
    #[error("State advanced to '{state}' but was not saved: {source}")]
    NotSaved {
        state: String,
        #[source]
        source: Box<PhaseflowError>,
    },

    /// No project directory found
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Invalid JSON format
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Persisted record does not match the workflow
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error with context
    #[error("{context}: {message}")]
    Wrapped { context: String, message: String },
}

impl PhaseflowError {
    /// Get the error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            PhaseflowError::UnexpectedState { .. } => "UNEXPECTED_STATE",
            PhaseflowError::CannotAdvance { .. } => "CANNOT_ADVANCE",
            PhaseflowError::NotSupported { .. } => "NOT_SUPPORTED",
            PhaseflowError::Validation(_) => "VALIDATION",
            PhaseflowError::InvalidInput(_) => "INVALID_INPUT",
            PhaseflowError::NotFound { .. } => "NOT_FOUND",
            PhaseflowError::Duplicate { .. } => "DUPLICATE",
            PhaseflowError::PhaseStatus { .. } => "PHASE_STATUS",
            PhaseflowError::Action(_) => "ACTION_FAILED",
            PhaseflowError::NotSaved { .. } => "NOT_SAVED",
            PhaseflowError::ProjectNotFound(_) => "PROJECT_NOT_FOUND",
            PhaseflowError::FileNotFound(_) => "FILE_NOT_FOUND",
            PhaseflowError::InvalidJson(_) => "INVALID_JSON",
            PhaseflowError::SchemaValidation(_) => "SCHEMA_VALIDATION",
            PhaseflowError::ConfigError(_) => "CONFIG_ERROR",
            PhaseflowError::Io(_) => "IO_ERROR",
            PhaseflowError::Wrapped { .. } => "WRAPPED_ERROR",
        }
    }

    /// Classify this error for programmatic handling
    pub fn kind(&self) -> ErrorKind {
        match self {
            PhaseflowError::UnexpectedState { .. } => ErrorKind::UnexpectedState,
            PhaseflowError::CannotAdvance { .. } => ErrorKind::CannotAdvance,
            PhaseflowError::NotSupported { .. } | PhaseflowError::PhaseStatus { .. } => {
                ErrorKind::NotSupported
            }
            PhaseflowError::Validation(_) => ErrorKind::Validation,
            PhaseflowError::InvalidInput(_)
            | PhaseflowError::NotFound { .. }
            | PhaseflowError::Duplicate { .. } => ErrorKind::Data,
            PhaseflowError::Action(_)
            | PhaseflowError::NotSaved { .. }
            | PhaseflowError::ProjectNotFound(_)
            | PhaseflowError::FileNotFound(_)
            | PhaseflowError::InvalidJson(_)
            | PhaseflowError::SchemaValidation(_)
            | PhaseflowError::ConfigError(_)
            | PhaseflowError::Io(_)
            | PhaseflowError::Wrapped { .. } => ErrorKind::Io,
        }
    }

    /// Shorthand for a `NotSupported` error
    pub fn not_supported(operation: impl Into<String>, target: impl Into<String>) -> Self {
        PhaseflowError::NotSupported {
            operation: operation.into(),
            target: target.into(),
        }
    }

    /// Wrap an error with additional context
    pub fn wrap<E: std::fmt::Display>(error: E, context: impl Into<String>) -> Self {
        PhaseflowError::Wrapped {
            context: context.into(),
            message: error.to_string(),
        }
    }
}

/// Convert an error to an appropriate exit code
pub fn to_exit_code(error: &PhaseflowError) -> i32 {
    match error {
        PhaseflowError::CannotAdvance { .. } => 2,
        PhaseflowError::UnexpectedState { .. } => 3,
        PhaseflowError::NotSaved { .. } => 4,
        _ => 1,
    }
}
