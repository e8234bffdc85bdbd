//! Access partitioning of candidate directories.

use std::path::PathBuf;

use curator_fsops::{AccessStatus, LibraryFs};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::context::normalized;
use crate::error::StageFailure;
use crate::stages::{StageOutput, StageResult};

/// Probe every directory for read and write access, `concurrency` at a time.
///
/// The partition is total and disjoint. A probe error counts as inaccessible.
/// When nothing is accessible the failure carries the inaccessible set.
pub async fn check_permissions(
    fs: &dyn LibraryFs,
    directories: &[PathBuf],
    concurrency: usize,
) -> StageResult {
    let probes: Vec<(PathBuf, bool)> = stream::iter(directories.iter().cloned())
        .map(move |dir| async move {
            let accessible = match fs.check_access(&dir).await {
                Ok(AccessStatus::Accessible) => true,
                Ok(AccessStatus::Denied { reason }) => {
                    debug!(dir = %dir.display(), reason, "directory not accessible");
                    false
                }
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "access probe failed");
                    false
                }
            };
            (dir, accessible)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let (accessible, inaccessible): (Vec<_>, Vec<_>) =
        probes.into_iter().partition(|(_, accessible)| *accessible);
    let accessible = normalized(accessible.into_iter().map(|(dir, _)| dir).collect());
    let inaccessible = normalized(inaccessible.into_iter().map(|(dir, _)| dir).collect());

    if accessible.is_empty() {
        return Err(StageFailure::NoAccessibleDirectories {
            dirs_to_report: inaccessible,
        });
    }
    Ok(StageOutput::Checked {
        accessible,
        inaccessible,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_test_support::{LibraryFixture, RestrictedFs};
    use std::error::Error;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    #[tokio::test]
    async fn partition_is_total_and_disjoint() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let mut dirs = Vec::new();
        for name in ["a", "b", "c", "d", "e"] {
            dirs.push(fixture.dir(name)?);
        }
        let missing = fixture.base().join("gone");
        dirs.push(missing.clone());
        let fs = RestrictedFs::local().deny(&dirs[1]).deny(&dirs[3]);

        let Ok(StageOutput::Checked {
            accessible,
            inaccessible,
        }) = check_permissions(&fs, &dirs, 2).await
        else {
            return Err("expected a partition".into());
        };

        assert_eq!(accessible, vec![dirs[0].clone(), dirs[2].clone(), dirs[4].clone()]);
        assert_eq!(inaccessible, vec![dirs[1].clone(), dirs[3].clone(), missing]);
        assert!(accessible.iter().all(|dir| !inaccessible.contains(dir)));
        let mut union: Vec<PathBuf> = accessible.iter().chain(&inaccessible).cloned().collect();
        union.sort();
        let mut expected = dirs.clone();
        expected.sort();
        assert_eq!(union, expected);
        Ok(())
    }

    #[tokio::test]
    async fn all_denied_fails_with_report_payload() -> TestResult<()> {
        let fixture = LibraryFixture::new()?;
        let locked = fixture.dir("locked")?;
        let fs = RestrictedFs::local().deny(&locked);
        let result = check_permissions(&fs, std::slice::from_ref(&locked), 8).await;
        assert_eq!(
            result,
            Err(StageFailure::NoAccessibleDirectories {
                dirs_to_report: vec![locked]
            })
        );
        Ok(())
    }
}
