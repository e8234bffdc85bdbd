//! File classification by extension and resolution.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use curator_fsops::LibraryFs;
use curator_media::{MediaProbe, ResolutionThreshold};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::context::normalized;
use crate::error::{FileIssue, StageFailure};
use crate::stages::{StageOutput, StageResult};

/// What makes a file qualify for relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRules {
    /// Case-sensitive extensions, without the leading dot.
    pub accepted_file_types: BTreeSet<String>,
    /// Bound the probed dimensions must exceed on both axes.
    pub threshold: ResolutionThreshold,
}

impl EvaluationRules {
    /// Whether `path` carries an accepted extension.
    #[must_use]
    pub fn accepts_extension(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.accepted_file_types.contains(ext))
    }
}

/// Substring after the final `.` of the file name, if any.
#[must_use]
pub fn extension_of(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    let (_, extension) = name.rsplit_once('.')?;
    (!extension.is_empty()).then_some(extension)
}

#[derive(Debug, Default)]
struct DirectoryVerdict {
    qualifying: Vec<PathBuf>,
    unreadable: Option<PathBuf>,
    issues: Vec<FileIssue>,
}

/// Classify the files in `directories`, `concurrency` directories at a time.
///
/// Unreadable directories and per-file probe failures are recorded, not escalated.
/// When no file qualifies the failure carries everything recorded.
pub async fn evaluate(
    fs: &dyn LibraryFs,
    probe: &dyn MediaProbe,
    directories: &[PathBuf],
    rules: &EvaluationRules,
    concurrency: usize,
) -> StageResult {
    let verdicts: Vec<DirectoryVerdict> = stream::iter(directories.iter().cloned())
        .map(move |dir| evaluate_directory(fs, probe, dir, rules))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut qualifying = Vec::new();
    let mut unreadable_dirs = Vec::new();
    let mut issues = Vec::new();
    for verdict in verdicts {
        qualifying.extend(verdict.qualifying);
        unreadable_dirs.extend(verdict.unreadable);
        issues.extend(verdict.issues);
    }
    let qualifying = normalized(qualifying);
    let unreadable_dirs = normalized(unreadable_dirs);
    issues.sort();
    issues.dedup();

    if qualifying.is_empty() {
        return Err(StageFailure::NoQualifyingFiles {
            issues,
            unreadable_dirs,
        });
    }
    Ok(StageOutput::Evaluated {
        qualifying,
        unreadable_dirs,
        issues,
    })
}

async fn evaluate_directory(
    fs: &dyn LibraryFs,
    probe: &dyn MediaProbe,
    dir: PathBuf,
    rules: &EvaluationRules,
) -> DirectoryVerdict {
    let files = match fs.list_files(&dir).await {
        Ok(files) => files,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "failed to list directory");
            return DirectoryVerdict {
                issues: vec![FileIssue::new(&dir, err.to_string())],
                unreadable: Some(dir),
                ..DirectoryVerdict::default()
            };
        }
    };

    let mut verdict = DirectoryVerdict::default();
    for file in files {
        if !rules.accepts_extension(&file) {
            continue;
        }
        match probe.probe(&file).await {
            Ok(dimensions) if rules.threshold.is_exceeded_by(dimensions) => {
                debug!(file = %file.display(), %dimensions, "file qualifies");
                verdict.qualifying.push(file);
            }
            Ok(dimensions) => {
                debug!(file = %file.display(), %dimensions, "below threshold");
            }
            Err(err) => {
                warn!(file = %file.display(), error = %err, "probe failed");
                verdict.issues.push(FileIssue::new(&file, err.to_string()));
            }
        }
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_fsops::LocalFs;
    use curator_test_support::{LibraryFixture, RestrictedFs, StaticProbe};
    use std::error::Error;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    fn rules(types: &[&str]) -> EvaluationRules {
        EvaluationRules {
            accepted_file_types: types.iter().map(ToString::to_string).collect(),
            threshold: ResolutionThreshold::FULL_HD,
        }
    }

    #[test]
    fn extension_is_text_after_final_dot() {
        assert_eq!(extension_of(Path::new("/a/movie.final.mkv")), Some("mkv"));
        assert_eq!(extension_of(Path::new("/a/MOVIE.MKV")), Some("MKV"));
        assert_eq!(extension_of(Path::new("/a/README")), None);
        assert_eq!(extension_of(Path::new("/a/trailing.")), None);
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        let rules = rules(&["mkv"]);
        assert!(rules.accepts_extension(Path::new("a.mkv")));
        assert!(!rules.accepts_extension(Path::new("a.MKV")));
        assert!(!rules.accepts_extension(Path::new("a.mp4")));
    }

    #[tokio::test]
    async fn qualifies_only_above_threshold_with_accepted_extension() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let dir = fixture.dir("Movie")?;
        let uhd = fixture.file("Movie/uhd.mp4", b"x")?;
        let hd = fixture.file("Movie/hd.mkv", b"x")?;
        let exact = fixture.file("Movie/exact.mkv", b"x")?;
        let wide = fixture.file("Movie/wide.mkv", b"x")?;
        let upper = fixture.file("Movie/upper.MP4", b"x")?;
        let text = fixture.file("Movie/notes.txt", b"x")?;
        let probe = StaticProbe::new()
            .with(&uhd, 3840, 2160)
            .with(&hd, 1280, 720)
            .with(&exact, 1920, 1080)
            .with(&wide, 3840, 1080)
            .with(&upper, 3840, 2160)
            .with(&text, 3840, 2160);

        let result = evaluate(&LocalFs, &probe, &[dir], &rules(&["mp4", "mkv"]), 4).await;
        assert_eq!(
            result,
            Ok(StageOutput::Evaluated {
                qualifying: vec![uhd],
                unreadable_dirs: vec![],
                issues: vec![],
            })
        );
        assert_eq!(probe.calls(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn records_unreadable_dirs_and_probe_failures() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let good = fixture.dir("Good")?;
        let locked = fixture.dir("Locked")?;
        let uhd = fixture.file("Good/uhd.mkv", b"x")?;
        let broken = fixture.file("Good/broken.mkv", b"x")?;
        let probe = StaticProbe::new().with(&uhd, 3840, 2160).failing(&broken);
        let fs = RestrictedFs::local().unreadable(&locked);

        let Ok(StageOutput::Evaluated {
            qualifying,
            unreadable_dirs,
            issues,
        }) = evaluate(&fs, &probe, &[good, locked.clone()], &rules(&["mkv"]), 2).await
        else {
            return Err("expected evaluation output".into());
        };
        assert_eq!(qualifying, vec![uhd]);
        assert_eq!(unreadable_dirs, vec![locked.clone()]);
        let issue_paths: Vec<_> = issues.iter().map(|issue| issue.path.clone()).collect();
        assert_eq!(issue_paths, vec![broken, locked]);
        Ok(())
    }

    #[tokio::test]
    async fn nothing_qualifying_is_a_failure() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let dir = fixture.dir("Movie")?;
        let hd = fixture.file("Movie/hd.mkv", b"x")?;
        let probe = StaticProbe::new().with(&hd, 1280, 720);
        let result = evaluate(&LocalFs, &probe, &[dir], &rules(&["mkv"]), 1).await;
        assert_eq!(
            result,
            Err(StageFailure::NoQualifyingFiles {
                issues: vec![],
                unreadable_dirs: vec![],
            })
        );
        Ok(())
    }
}
