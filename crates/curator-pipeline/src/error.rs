//! Stage failures, item-level issues, and controller errors.
//!
//! # Design
//! - `StageFailure` is the only shape a stage can fail with; collaborator errors are
//!   folded into it (or into item-level records) before they reach the controller.
//! - `WorkflowError` covers controller misuse and is never routed to reporting.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::state::{PipelineState, Trigger};

/// A file or directory the evaluator could not classify.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FileIssue {
    /// Offending path.
    pub path: PathBuf,
    /// Description of the failure.
    pub reason: String,
}

impl FileIssue {
    /// Build an issue for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A file the mover could not relocate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MoveError {
    /// File that stayed in place.
    pub source: PathBuf,
    /// Intended destination, when it could be computed.
    pub destination: Option<PathBuf>,
    /// Description of the failure.
    pub reason: String,
}

/// Structured stage failure; every variant routes the run to `reporting_errors`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageFailure {
    /// Scanning produced no candidate directories.
    #[error("No valid directories found")]
    NoDirectoriesFound {
        /// Listing error, when the base path could not be read.
        reason: Option<String>,
    },
    /// Every candidate directory was inaccessible.
    #[error("No accessible files found to move")]
    NoAccessibleDirectories {
        /// Directories that failed the access probe.
        dirs_to_report: Vec<PathBuf>,
    },
    /// No file qualified for relocation.
    #[error("No files found to move")]
    NoQualifyingFiles {
        /// Per-file problems recorded while evaluating.
        issues: Vec<FileIssue>,
        /// Directories whose listing failed.
        unreadable_dirs: Vec<PathBuf>,
    },
    /// At least one relocation failed.
    #[error("files moved with errors")]
    MoveBatchError {
        /// Per-file relocation failures.
        errors: Vec<MoveError>,
        /// Files relocated before the batch was judged.
        moved: Vec<PathBuf>,
        /// Files already present at their destination.
        skipped: Vec<PathBuf>,
    },
}

impl StageFailure {
    /// Machine-friendly discriminator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoDirectoriesFound { .. } => "no_directories_found",
            Self::NoAccessibleDirectories { .. } => "no_accessible_directories",
            Self::NoQualifyingFiles { .. } => "no_qualifying_files",
            Self::MoveBatchError { .. } => "move_batch_error",
        }
    }
}

/// Controller errors, distinct from stage failures.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The trigger is not accepted in the current state.
    #[error("trigger not accepted in current state")]
    TriggerRejected {
        /// Trigger that was sent.
        trigger: Trigger,
        /// State the workflow was in.
        state: PipelineState,
    },
    /// A stage state was entered without a run context.
    #[error("workflow has no active run context")]
    MissingContext {
        /// State that needed the context.
        state: PipelineState,
    },
    /// The transition table has no row for a stage outcome.
    #[error("no transition defined for stage outcome")]
    MissingTransition {
        /// State the stage ran in.
        state: PipelineState,
        /// Outcome label.
        outcome: &'static str,
    },
    /// Scan exclude patterns failed to compile.
    #[error("invalid workflow settings")]
    InvalidSettings {
        /// Source filesystem error.
        source: curator_fsops::FsOpsError,
    },
}

/// Result alias for controller operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
