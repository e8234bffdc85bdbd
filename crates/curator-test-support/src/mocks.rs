//! Test doubles for the curation collaborators.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use curator_fsops::{AccessStatus, FsOpsError, FsOpsResult, LibraryFs, LocalFs, ProcessedLedger};
use curator_media::{FrameDimensions, MediaProbe, ProbeError, ProbeResult};
use tokio::sync::Mutex;

/// Probe answering from a fixed table keyed by path.
///
/// Unknown paths fail with [`ProbeError::NoVideoStream`].
#[derive(Debug, Default)]
pub struct StaticProbe {
    dimensions: HashMap<PathBuf, FrameDimensions>,
    failures: HashSet<PathBuf>,
    calls: AtomicUsize,
}

impl StaticProbe {
    /// Empty probe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `width`x`height` for `path`.
    #[must_use]
    pub fn with(mut self, path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        self.dimensions
            .insert(path.into(), FrameDimensions::new(width, height));
        self
    }

    /// Fail as if the probe process exited unsuccessfully for `path`.
    #[must_use]
    pub fn failing(mut self, path: impl Into<PathBuf>) -> Self {
        self.failures.insert(path.into());
        self
    }

    /// Number of probe calls served.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProbe for StaticProbe {
    async fn probe(&self, path: &Path) -> ProbeResult<FrameDimensions> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.contains(path) {
            return Err(ProbeError::Failed {
                path: path.to_path_buf(),
                status: Some(1),
            });
        }
        self.dimensions
            .get(path)
            .copied()
            .ok_or_else(|| ProbeError::NoVideoStream {
                path: path.to_path_buf(),
            })
    }
}

/// [`LibraryFs`] wrapper that denies access or listing for chosen paths.
///
/// Tests usually run with privileges that bypass permission bits, so denial is
/// simulated here rather than through `chmod`.
#[derive(Debug, Default)]
pub struct RestrictedFs<F = LocalFs> {
    inner: F,
    denied: HashSet<PathBuf>,
    unreadable: HashSet<PathBuf>,
    failing_moves: HashSet<PathBuf>,
}

impl RestrictedFs<LocalFs> {
    /// Wrap the local filesystem.
    #[must_use]
    pub fn local() -> Self {
        Self::new(LocalFs::new())
    }
}

impl<F> RestrictedFs<F> {
    /// Wrap `inner` with no restrictions.
    #[must_use]
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            denied: HashSet::new(),
            unreadable: HashSet::new(),
            failing_moves: HashSet::new(),
        }
    }

    /// Report `path` as inaccessible from `check_access`.
    #[must_use]
    pub fn deny(mut self, path: impl Into<PathBuf>) -> Self {
        self.denied.insert(path.into());
        self
    }

    /// Fail `list_files` for `path` with a permission error.
    #[must_use]
    pub fn unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.unreadable.insert(path.into());
        self
    }

    /// Fail `move_path` whenever `source` is moved.
    #[must_use]
    pub fn fail_move(mut self, source: impl Into<PathBuf>) -> Self {
        self.failing_moves.insert(source.into());
        self
    }
}

fn permission_denied(operation: &'static str, path: &Path) -> FsOpsError {
    FsOpsError::Io {
        operation,
        path: path.to_path_buf(),
        source: io::Error::from(io::ErrorKind::PermissionDenied),
    }
}

#[async_trait]
impl<F: LibraryFs> LibraryFs for RestrictedFs<F> {
    async fn list_directories(&self, root: &Path, recursive: bool) -> FsOpsResult<Vec<PathBuf>> {
        self.inner.list_directories(root, recursive).await
    }

    async fn list_files(&self, dir: &Path) -> FsOpsResult<Vec<PathBuf>> {
        if self.unreadable.contains(dir) {
            return Err(permission_denied("read_dir", dir));
        }
        self.inner.list_files(dir).await
    }

    async fn check_access(&self, path: &Path) -> FsOpsResult<AccessStatus> {
        if self.denied.contains(path) {
            return Ok(AccessStatus::Denied {
                reason: "Permission denied",
            });
        }
        self.inner.check_access(path).await
    }

    async fn path_exists(&self, path: &Path) -> FsOpsResult<bool> {
        self.inner.path_exists(path).await
    }

    async fn move_path(&self, source: &Path, destination: &Path) -> FsOpsResult<()> {
        if self.failing_moves.contains(source) {
            return Err(permission_denied("move_path.rename", source));
        }
        self.inner.move_path(source, destination).await
    }
}

/// Ledger that keeps a preset of known directories and records every write.
#[derive(Debug, Default)]
pub struct RecordingLedger {
    known: BTreeSet<PathBuf>,
    recorded: Mutex<Vec<PathBuf>>,
}

impl RecordingLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `dir` as processed by an earlier run.
    #[must_use]
    pub fn knowing(mut self, dir: impl Into<PathBuf>) -> Self {
        self.known.insert(dir.into());
        self
    }

    /// Directories recorded so far, in call order.
    pub async fn recorded(&self) -> Vec<PathBuf> {
        self.recorded.lock().await.clone()
    }
}

#[async_trait]
impl ProcessedLedger for RecordingLedger {
    async fn is_known_processed(&self, dir: &Path) -> FsOpsResult<bool> {
        Ok(self.known.contains(dir) || self.recorded.lock().await.iter().any(|d| d == dir))
    }

    async fn record_processed(&self, dirs: &[PathBuf]) -> FsOpsResult<()> {
        self.recorded.lock().await.extend(dirs.iter().cloned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    #[tokio::test]
    async fn static_probe_answers_from_table() -> TestResult<()> {
        let probe = StaticProbe::new()
            .with("/a.mkv", 3840, 2160)
            .failing("/b.mkv");
        assert_eq!(
            probe.probe(Path::new("/a.mkv")).await?,
            FrameDimensions::new(3840, 2160)
        );
        assert!(matches!(
            probe.probe(Path::new("/b.mkv")).await,
            Err(ProbeError::Failed { .. })
        ));
        assert!(matches!(
            probe.probe(Path::new("/c.mkv")).await,
            Err(ProbeError::NoVideoStream { .. })
        ));
        assert_eq!(probe.calls(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn restricted_fs_denies_selected_paths() -> TestResult<()> {
        let temp = tempfile::tempdir()?;
        let locked = temp.path().join("locked");
        std::fs::create_dir_all(&locked)?;
        let fs = RestrictedFs::local().deny(&locked).unreadable(&locked);

        assert!(!fs.check_access(&locked).await?.is_accessible());
        assert!(fs.check_access(temp.path()).await?.is_accessible());
        assert!(fs.list_files(&locked).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn recording_ledger_tracks_writes() -> TestResult<()> {
        let ledger = RecordingLedger::new().knowing("/lib/old");
        assert!(ledger.is_known_processed(Path::new("/lib/old")).await?);
        ledger.record_processed(&[PathBuf::from("/lib/new")]).await?;
        assert!(ledger.is_known_processed(Path::new("/lib/new")).await?);
        assert_eq!(ledger.recorded().await, vec![PathBuf::from("/lib/new")]);
        Ok(())
    }
}
