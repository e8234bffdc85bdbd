//! Stage actors.
//!
//! # Design
//! - Each actor is an async function over a read-only slice of the run context and
//!   the collaborators it needs; it returns `StageResult` and never touches the
//!   context itself.
//! - Item-level work fans out through `buffer_unordered`; results are sorted before
//!   they leave the actor.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{FileIssue, StageFailure};

pub mod evaluator;
pub mod mover;
pub mod permissions;
pub mod scanner;

pub use evaluator::{EvaluationRules, evaluate, extension_of};
pub use mover::relocate;
pub use permissions::check_permissions;
pub use scanner::{ScanRules, scan};

/// Successful output of a stage actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageOutput {
    /// Candidate directories discovered beneath the base path.
    Scanned {
        /// Sorted candidate directories.
        directories: Vec<PathBuf>,
    },
    /// Candidate directories partitioned by access.
    Checked {
        /// Directories that passed the access probe.
        accessible: Vec<PathBuf>,
        /// Directories that failed the access probe.
        inaccessible: Vec<PathBuf>,
    },
    /// Files classified for relocation.
    Evaluated {
        /// Files that qualify.
        qualifying: Vec<PathBuf>,
        /// Directories whose listing failed.
        unreadable_dirs: Vec<PathBuf>,
        /// Per-file problems.
        issues: Vec<FileIssue>,
    },
    /// Files relocated into the destination library.
    Moved {
        /// Files moved by this run.
        moved: Vec<PathBuf>,
        /// Files already present at their destination.
        skipped: Vec<PathBuf>,
    },
}

impl StageOutput {
    /// One-line summary used in logs and events.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Scanned { directories } => format!("{} directories found", directories.len()),
            Self::Checked {
                accessible,
                inaccessible,
            } => format!(
                "{} accessible, {} inaccessible",
                accessible.len(),
                inaccessible.len()
            ),
            Self::Evaluated {
                qualifying, issues, ..
            } => format!("{} qualifying files, {} issues", qualifying.len(), issues.len()),
            Self::Moved { moved, skipped } => format!(
                "all files moved successfully ({} moved, {} skipped)",
                moved.len(),
                skipped.len()
            ),
        }
    }
}

/// Outcome of a stage actor.
pub type StageResult = Result<StageOutput, StageFailure>;
