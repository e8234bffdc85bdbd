//! Library filesystem access.
//!
//! # Design
//! - `LibraryFs` is the seam the pipeline stages talk to; tests wrap or replace it.
//! - `LocalFs` uses `tokio::fs` for single-level work and the blocking pool for
//!   `walkdir` traversal and `access(2)` probes.
//! - Listings are sorted so callers see a deterministic order.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use nix::errno::Errno;
use nix::unistd::{AccessFlags, access};
use tokio::fs;
use tokio::task;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

/// Outcome of probing a directory for read and write access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    /// The current process may read and write the directory.
    Accessible,
    /// Access was refused.
    Denied {
        /// Static description of the refusal.
        reason: &'static str,
    },
}

impl AccessStatus {
    /// Whether the probe granted access.
    #[must_use]
    pub const fn is_accessible(self) -> bool {
        matches!(self, Self::Accessible)
    }
}

/// Filesystem operations the curation pipeline depends on.
#[async_trait]
pub trait LibraryFs: Send + Sync {
    /// List directories beneath `root`, descending when `recursive` is set.
    async fn list_directories(&self, root: &Path, recursive: bool) -> FsOpsResult<Vec<PathBuf>>;
    /// List regular files directly inside `dir`.
    async fn list_files(&self, dir: &Path) -> FsOpsResult<Vec<PathBuf>>;
    /// Probe read and write access for `path`.
    async fn check_access(&self, path: &Path) -> FsOpsResult<AccessStatus>;
    /// Whether `path` exists.
    async fn path_exists(&self, path: &Path) -> FsOpsResult<bool>;
    /// Move a file to `destination`, creating missing parent directories.
    async fn move_path(&self, source: &Path, destination: &Path) -> FsOpsResult<()>;
}

/// [`LibraryFs`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Construct the local filesystem adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LibraryFs for LocalFs {
    async fn list_directories(&self, root: &Path, recursive: bool) -> FsOpsResult<Vec<PathBuf>> {
        let mut directories = if recursive {
            let root = root.to_path_buf();
            task::spawn_blocking(move || walk_directories(&root))
                .await
                .map_err(|source| FsOpsError::Join {
                    operation: "list_directories.walk",
                    source,
                })??
        } else {
            list_entries(root, EntryKind::Directory).await?
        };
        directories.sort();
        debug!(root = %root.display(), recursive, count = directories.len(), "listed directories");
        Ok(directories)
    }

    async fn list_files(&self, dir: &Path) -> FsOpsResult<Vec<PathBuf>> {
        let mut files = list_entries(dir, EntryKind::File).await?;
        files.sort();
        Ok(files)
    }

    async fn check_access(&self, path: &Path) -> FsOpsResult<AccessStatus> {
        let owned = path.to_path_buf();
        let result = task::spawn_blocking(move || {
            access(owned.as_path(), AccessFlags::R_OK | AccessFlags::W_OK)
        })
        .await
        .map_err(|source| FsOpsError::Join {
            operation: "check_access",
            source,
        })?;

        match result {
            Ok(()) => Ok(AccessStatus::Accessible),
            Err(errno @ (Errno::EACCES | Errno::EPERM | Errno::EROFS)) => {
                Ok(AccessStatus::Denied {
                    reason: errno.desc(),
                })
            }
            Err(errno) => Err(FsOpsError::nix("check_access", path, errno)),
        }
    }

    async fn path_exists(&self, path: &Path) -> FsOpsResult<bool> {
        fs::try_exists(path)
            .await
            .map_err(|source| FsOpsError::io("path_exists", path, source))
    }

    async fn move_path(&self, source: &Path, destination: &Path) -> FsOpsResult<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| FsOpsError::io("move_path.create_parent", parent, err))?;
        }

        match fs::rename(source, destination).await {
            Ok(()) => Ok(()),
            Err(rename_err) if rename_err.kind() == io::ErrorKind::NotFound => {
                Err(FsOpsError::io("move_path.rename", source, rename_err))
            }
            Err(rename_err) => {
                debug!(
                    source = %source.display(),
                    error = %rename_err,
                    "rename failed; falling back to copy"
                );
                fs::copy(source, destination)
                    .await
                    .map_err(|err| FsOpsError::io("move_path.copy", destination, err))?;
                fs::remove_file(source)
                    .await
                    .map_err(|err| FsOpsError::io("move_path.cleanup", source, err))
            }
        }
    }
}

#[derive(Clone, Copy)]
enum EntryKind {
    Directory,
    File,
}

async fn list_entries(dir: &Path, kind: EntryKind) -> FsOpsResult<Vec<PathBuf>> {
    let mut reader = fs::read_dir(dir)
        .await
        .map_err(|source| FsOpsError::io("read_dir", dir, source))?;
    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|source| FsOpsError::io("read_dir.next_entry", dir, source))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|source| FsOpsError::io("read_dir.file_type", entry.path(), source))?;
        let keep = match kind {
            EntryKind::Directory => file_type.is_dir(),
            EntryKind::File => file_type.is_file(),
        };
        if keep {
            entries.push(entry.path());
        }
    }
    Ok(entries)
}

fn walk_directories(root: &Path) -> FsOpsResult<Vec<PathBuf>> {
    let mut directories = Vec::new();
    for entry in WalkDir::new(root).min_depth(1) {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => directories.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => keep_unreadable(root, err, &mut directories)?,
        }
    }
    directories.sort();
    directories.dedup();
    Ok(directories)
}

/// Only a failure on `root` itself aborts the walk. A nested directory that cannot be
/// read stays listed so the access check can report it.
fn keep_unreadable(
    root: &Path,
    err: walkdir::Error,
    directories: &mut Vec<PathBuf>,
) -> FsOpsResult<()> {
    if err.depth() == 0 {
        return Err(FsOpsError::walkdir("list_directories.walk", root, err));
    }
    match err.path() {
        Some(path) => {
            warn!(
                root = %root.display(),
                path = %path.display(),
                error = %err,
                "nested directory unreadable"
            );
            directories.push(path.to_path_buf());
        }
        None => warn!(root = %root.display(), error = %err, "walk entry unreadable"),
    }
    Ok(())
}
