//! CLI module for phaseflow
//!
//! Provides the command-line interface using clap.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Phaseflow - drive a project record through a phased workflow
#[derive(Parser, Debug)]
#[command(name = "phaseflow")]
#[command(version)]
#[command(about = "Drive a project record through a phased workflow state machine")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress info-level output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Override the working directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .phaseflow and a new project record
    Init {
        /// Project name
        name: String,

        /// Workflow to use (defaults to the configured default_project_type)
        #[arg(long = "type")]
        project_type: Option<String>,

        /// Short description stored on the record
        #[arg(long)]
        description: Option<String>,

        /// Replace an existing project record
        #[arg(long)]
        force: bool,
    },

    /// Show the current state and the prompt for it
    Status {
        /// Output the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the available workflows
    Workflows,

    /// Check whether an event could fire now
    CanFire {
        /// Event name
        event: String,
    },

    /// Fire an event
    Fire {
        /// Event name
        event: String,
    },

    /// Fire the event mapped to the current state
    Advance,

    /// Work with artifacts of an artifact phase
    Artifact {
        #[command(subcommand)]
        action: ArtifactAction,
    },

    /// Work with tasks of a task phase
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Phase-level operations
    Phase {
        #[command(subcommand)]
        action: PhaseAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ArtifactAction {
    /// Register an artifact
    Add {
        phase: String,
        path: String,

        /// Artifact type, e.g. task_list or review
        #[arg(long = "type")]
        artifact_type: Option<String>,
    },

    /// Approve an artifact
    Approve {
        phase: String,
        path: String,

        /// Assessment recorded with the approval, e.g. pass or fail
        #[arg(long)]
        assessment: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskAction {
    /// Add a pending task
    Add {
        phase: String,
        id: String,
        name: String,

        /// Ids of tasks this one depends on (repeatable)
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
    },

    /// Change a task's status
    Status {
        phase: String,
        id: String,

        /// pending, in_progress, needs_review, completed or abandoned
        status: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PhaseAction {
    /// Approve the task list of a task phase
    ApproveTasks { phase: String },

    /// Mark a phase completed
    Complete { phase: String },

    /// Mark a phase skipped
    Skip { phase: String },

    /// Enable a phase declared disabled
    Enable { phase: String },
}
