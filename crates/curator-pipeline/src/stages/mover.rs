//! Relocation of qualifying files.

use std::path::{Path, PathBuf};

use curator_fsops::{LibraryFs, destination_for};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::context::normalized;
use crate::error::{MoveError, StageFailure};
use crate::stages::{StageOutput, StageResult};

enum Relocation {
    Moved(PathBuf),
    Skipped(PathBuf),
    Failed(MoveError),
}

/// Move `files` beneath `destination`, `concurrency` at a time.
///
/// Files already relocated (listed in `processed`, or present at their
/// destination) are skipped without error. Any per-file failure turns the batch
/// into [`StageFailure::MoveBatchError`].
pub async fn relocate(
    fs: &dyn LibraryFs,
    files: &[PathBuf],
    base: &Path,
    destination: &Path,
    processed: &[PathBuf],
    concurrency: usize,
) -> StageResult {
    let results: Vec<Relocation> = stream::iter(files.iter().cloned())
        .map(move |file| relocate_one(fs, file, base, destination, processed))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut moved = Vec::new();
    let mut skipped = Vec::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Relocation::Moved(file) => moved.push(file),
            Relocation::Skipped(file) => skipped.push(file),
            Relocation::Failed(error) => errors.push(error),
        }
    }
    let moved = normalized(moved);
    let skipped = normalized(skipped);
    errors.sort();

    if !errors.is_empty() {
        return Err(StageFailure::MoveBatchError {
            errors,
            moved,
            skipped,
        });
    }
    info!(moved = moved.len(), skipped = skipped.len(), "all files moved successfully");
    Ok(StageOutput::Moved { moved, skipped })
}

async fn relocate_one(
    fs: &dyn LibraryFs,
    file: PathBuf,
    base: &Path,
    destination: &Path,
    processed: &[PathBuf],
) -> Relocation {
    let target = match destination_for(&file, base, destination) {
        Ok(target) => target,
        Err(err) => {
            return Relocation::Failed(MoveError {
                reason: err.to_string(),
                source: file,
                destination: None,
            });
        }
    };

    let already_processed = processed.binary_search(&file).is_ok();
    match fs.path_exists(&target).await {
        Ok(true) => {
            debug!(file = %file.display(), target = %target.display(), "destination exists; skipping");
            return Relocation::Skipped(file);
        }
        Ok(false) if already_processed => {
            debug!(file = %file.display(), "already processed; skipping");
            return Relocation::Skipped(file);
        }
        Ok(false) => {}
        Err(err) => {
            return Relocation::Failed(MoveError {
                reason: err.to_string(),
                source: file,
                destination: Some(target),
            });
        }
    }

    match fs.move_path(&file, &target).await {
        Ok(()) => {
            debug!(file = %file.display(), target = %target.display(), "file relocated");
            Relocation::Moved(file)
        }
        Err(err) => {
            warn!(file = %file.display(), target = %target.display(), error = %err, "relocation failed");
            Relocation::Failed(MoveError {
                reason: err.to_string(),
                source: file,
                destination: Some(target),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_fsops::LocalFs;
    use curator_test_support::{LibraryFixture, RestrictedFs};
    use std::error::Error;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    #[tokio::test]
    async fn moves_files_keeping_relative_layout() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let file = fixture.file("Show/S01/ep1.mkv", b"frames")?;
        let result = relocate(
            &LocalFs,
            std::slice::from_ref(&file),
            fixture.base(),
            fixture.destination(),
            &[],
            4,
        )
        .await;
        assert_eq!(
            result,
            Ok(StageOutput::Moved {
                moved: vec![file.clone()],
                skipped: vec![],
            })
        );
        assert!(!file.exists());
        assert_eq!(std::fs::read(fixture.moved("Show/S01/ep1.mkv"))?, b"frames");
        Ok(())
    }

    #[tokio::test]
    async fn second_move_is_skipped_without_error() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let file = fixture.file("Movie/movie.mp4", b"frames")?;
        let files = vec![file.clone()];

        relocate(&LocalFs, &files, fixture.base(), fixture.destination(), &[], 1).await?;
        let again = relocate(&LocalFs, &files, fixture.base(), fixture.destination(), &[], 1).await;
        assert_eq!(
            again,
            Ok(StageOutput::Moved {
                moved: vec![],
                skipped: vec![file],
            })
        );
        let entries = std::fs::read_dir(fixture.destination().join("Movie"))?.count();
        assert_eq!(entries, 1);
        Ok(())
    }

    #[tokio::test]
    async fn existing_destination_is_left_alone() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let file = fixture.file("Movie/movie.mp4", b"new")?;
        let target = fixture.moved("Movie/movie.mp4");
        std::fs::create_dir_all(fixture.destination().join("Movie"))?;
        std::fs::write(&target, b"old")?;

        let result = relocate(
            &LocalFs,
            std::slice::from_ref(&file),
            fixture.base(),
            fixture.destination(),
            &[],
            1,
        )
        .await;
        assert!(matches!(result, Ok(StageOutput::Moved { ref skipped, .. }) if skipped.len() == 1));
        assert_eq!(std::fs::read(&target)?, b"old");
        assert!(file.exists());
        Ok(())
    }

    #[tokio::test]
    async fn per_file_failures_become_batch_error() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let ok = fixture.file("A/ok.mkv", b"x")?;
        let stuck = fixture.file("B/stuck.mkv", b"x")?;
        let fs = RestrictedFs::local().fail_move(&stuck);

        let result = relocate(
            &fs,
            &[ok.clone(), stuck.clone()],
            fixture.base(),
            fixture.destination(),
            &[],
            2,
        )
        .await;
        let Err(StageFailure::MoveBatchError {
            errors,
            moved,
            skipped,
        }) = result
        else {
            return Err("expected a batch error".into());
        };
        assert_eq!(moved, vec![ok]);
        assert!(skipped.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].source, stuck);
        assert_eq!(errors[0].destination, Some(fixture.moved("B/stuck.mkv")));
        Ok(())
    }
}
