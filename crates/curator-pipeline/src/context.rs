//! Run context threaded through the pipeline.
//!
//! # Design
//! - The context is replaced, never patched: `merge` and `merge_failure` consume it
//!   and return the next value.
//! - Every path list is kept sorted and de-duplicated.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{FileIssue, StageFailure};
use crate::stages::StageOutput;

/// State accumulated over a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunContext {
    /// Identifier of the run.
    pub run_id: Uuid,
    /// When the run was triggered.
    pub started_at: DateTime<Utc>,
    /// Root scanned for candidate directories.
    pub base_path: PathBuf,
    /// Root qualifying files are relocated beneath.
    pub destination_path: PathBuf,
    /// Case-sensitive extensions eligible for relocation.
    pub accepted_file_types: BTreeSet<String>,
    /// Directories produced by scanning.
    pub directories_to_check: Vec<PathBuf>,
    /// Directories confirmed accessible.
    pub dirs_to_evaluate: Vec<PathBuf>,
    /// Directories that were inaccessible or could not be evaluated.
    pub dirs_to_report: Vec<PathBuf>,
    /// Files that qualify for relocation.
    pub dirs_to_move: Vec<PathBuf>,
    /// Files relocated by this or an earlier run.
    pub processed_files: Vec<PathBuf>,
    /// Item-level problems recorded while evaluating.
    pub file_issues: Vec<FileIssue>,
}

impl RunContext {
    /// Start a fresh run seeded with previously processed files.
    #[must_use]
    pub fn new(
        base_path: PathBuf,
        destination_path: PathBuf,
        accepted_file_types: BTreeSet<String>,
        processed_files: Vec<PathBuf>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            base_path,
            destination_path,
            accepted_file_types,
            directories_to_check: Vec::new(),
            dirs_to_evaluate: Vec::new(),
            dirs_to_report: Vec::new(),
            dirs_to_move: Vec::new(),
            processed_files: normalized(processed_files),
            file_issues: Vec::new(),
        }
    }

    /// Fold a successful stage output into the context.
    #[must_use]
    pub fn merge(self, output: &StageOutput) -> Self {
        match output {
            StageOutput::Scanned { directories } => Self {
                directories_to_check: normalized(directories.clone()),
                ..self
            },
            StageOutput::Checked {
                accessible,
                inaccessible,
            } => Self {
                dirs_to_evaluate: normalized(accessible.clone()),
                dirs_to_report: union(self.dirs_to_report, inaccessible),
                ..self
            },
            StageOutput::Evaluated {
                qualifying,
                unreadable_dirs,
                issues,
            } => {
                let mut file_issues = self.file_issues;
                file_issues.extend(issues.iter().cloned());
                file_issues.sort();
                file_issues.dedup();
                Self {
                    dirs_to_move: normalized(qualifying.clone()),
                    dirs_to_report: union(self.dirs_to_report, unreadable_dirs),
                    file_issues,
                    ..self
                }
            }
            StageOutput::Moved { moved, .. } => Self {
                processed_files: union(self.processed_files, moved),
                ..self
            },
        }
    }

    /// Fold a stage failure into the context.
    ///
    /// Only an access failure carries data worth keeping; other failures leave the
    /// context untouched.
    #[must_use]
    pub fn merge_failure(self, failure: &StageFailure) -> Self {
        match failure {
            StageFailure::NoAccessibleDirectories { dirs_to_report } => Self {
                dirs_to_evaluate: Vec::new(),
                dirs_to_report: union(self.dirs_to_report, dirs_to_report),
                ..self
            },
            StageFailure::NoDirectoriesFound { .. }
            | StageFailure::NoQualifyingFiles { .. }
            | StageFailure::MoveBatchError { .. } => self,
        }
    }

    /// Directories that were evaluated without being reported.
    #[must_use]
    pub fn completed_directories(&self) -> Vec<PathBuf> {
        self.dirs_to_evaluate
            .iter()
            .filter(|dir| self.dirs_to_report.binary_search(*dir).is_err())
            .cloned()
            .collect()
    }
}

pub(crate) fn normalized(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort();
    paths.dedup();
    paths
}

fn union(existing: Vec<PathBuf>, extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut merged = existing;
    merged.extend(extra.iter().cloned());
    normalized(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RunContext {
        RunContext::new(
            PathBuf::from("/lib/in"),
            PathBuf::from("/lib/out"),
            BTreeSet::from(["mkv".to_string()]),
            vec![PathBuf::from("/lib/in/z.mkv"), PathBuf::from("/lib/in/z.mkv")],
        )
    }

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn new_context_dedups_seeded_history() {
        let ctx = context();
        assert_eq!(ctx.processed_files, paths(&["/lib/in/z.mkv"]));
        assert!(ctx.directories_to_check.is_empty());
    }

    #[test]
    fn merges_accumulate_reports_across_stages() {
        let ctx = context()
            .merge(&StageOutput::Scanned {
                directories: paths(&["/lib/in/b", "/lib/in/a", "/lib/in/c"]),
            })
            .merge(&StageOutput::Checked {
                accessible: paths(&["/lib/in/b", "/lib/in/a"]),
                inaccessible: paths(&["/lib/in/c"]),
            })
            .merge(&StageOutput::Evaluated {
                qualifying: paths(&["/lib/in/a/x.mkv"]),
                unreadable_dirs: paths(&["/lib/in/b"]),
                issues: vec![FileIssue::new("/lib/in/a/y.mkv", "probe failed")],
            });

        assert_eq!(
            ctx.directories_to_check,
            paths(&["/lib/in/a", "/lib/in/b", "/lib/in/c"])
        );
        assert_eq!(ctx.dirs_to_evaluate, paths(&["/lib/in/a", "/lib/in/b"]));
        assert_eq!(ctx.dirs_to_report, paths(&["/lib/in/b", "/lib/in/c"]));
        assert_eq!(ctx.dirs_to_move, paths(&["/lib/in/a/x.mkv"]));
        assert_eq!(ctx.file_issues.len(), 1);
        assert_eq!(ctx.completed_directories(), paths(&["/lib/in/a"]));
    }

    #[test]
    fn only_moved_files_join_history() {
        let ctx = context().merge(&StageOutput::Moved {
            moved: paths(&["/lib/in/a/x.mkv"]),
            skipped: paths(&["/lib/in/z.mkv"]),
        });
        assert_eq!(ctx.processed_files, paths(&["/lib/in/a/x.mkv"]));
        assert!(!ctx.processed_files.contains(&PathBuf::from("/lib/in/z.mkv")));
    }

    #[test]
    fn only_access_failures_merge() {
        let base = context().merge(&StageOutput::Scanned {
            directories: paths(&["/lib/in/a"]),
        });
        let failed = base.clone().merge_failure(&StageFailure::NoAccessibleDirectories {
            dirs_to_report: paths(&["/lib/in/a"]),
        });
        assert_eq!(failed.dirs_to_report, paths(&["/lib/in/a"]));
        assert!(failed.dirs_to_evaluate.is_empty());

        let unchanged = base
            .clone()
            .merge_failure(&StageFailure::NoDirectoriesFound { reason: None });
        assert_eq!(unchanged, base);
    }
}
