//! Ledger of directories processed by earlier runs.
//!
//! # Design
//! - The scanner consults the ledger to skip directories already curated.
//! - `JsonLedger` keeps the set in memory and rewrites the document through a
//!   temporary sibling file so a crash never leaves a truncated ledger behind.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{FsOpsError, FsOpsResult};

const LEDGER_VERSION: u32 = 1;

/// Persistence of processed directories.
#[async_trait]
pub trait ProcessedLedger: Send + Sync {
    /// Whether `dir` was recorded by an earlier run.
    async fn is_known_processed(&self, dir: &Path) -> FsOpsResult<bool>;
    /// Record `dirs` as processed.
    async fn record_processed(&self, dirs: &[PathBuf]) -> FsOpsResult<()>;
}

/// Ledger that remembers nothing; every directory is treated as new.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLedger;

#[async_trait]
impl ProcessedLedger for NoopLedger {
    async fn is_known_processed(&self, _dir: &Path) -> FsOpsResult<bool> {
        Ok(false)
    }

    async fn record_processed(&self, _dirs: &[PathBuf]) -> FsOpsResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDocument {
    version: u32,
    directories: BTreeSet<PathBuf>,
}

/// Ledger persisted as a JSON document.
#[derive(Debug)]
pub struct JsonLedger {
    path: PathBuf,
    entries: Mutex<BTreeSet<PathBuf>>,
}

impl JsonLedger {
    /// Open the ledger at `path`; a missing file starts an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> FsOpsResult<Self> {
        let path = path.into();
        let entries = match fs::read(&path).await {
            Ok(bytes) => {
                let document: LedgerDocument = serde_json::from_slice(&bytes)
                    .map_err(|source| FsOpsError::json("ledger.parse", &path, source))?;
                if document.version != LEDGER_VERSION {
                    return Err(FsOpsError::InvalidInput {
                        field: "ledger.version",
                        reason: "unsupported_version",
                        value: Some(document.version.to_string()),
                    });
                }
                document.directories
            }
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(source) => return Err(FsOpsError::io("ledger.read", &path, source)),
        };
        debug!(path = %path.display(), entries = entries.len(), "ledger opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the ledger document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of every recorded directory.
    pub async fn entries(&self) -> Vec<PathBuf> {
        self.entries.lock().await.iter().cloned().collect()
    }

    async fn persist(&self, entries: &BTreeSet<PathBuf>) -> FsOpsResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| FsOpsError::io("ledger.create_parent", parent, source))?;
        }
        let document = LedgerDocument {
            version: LEDGER_VERSION,
            directories: entries.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|source| FsOpsError::json("ledger.serialize", &self.path, source))?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, bytes)
            .await
            .map_err(|source| FsOpsError::io("ledger.write", &staging, source))?;
        fs::rename(&staging, &self.path)
            .await
            .map_err(|source| FsOpsError::io("ledger.rename", &self.path, source))
    }
}

#[async_trait]
impl ProcessedLedger for JsonLedger {
    async fn is_known_processed(&self, dir: &Path) -> FsOpsResult<bool> {
        Ok(self.entries.lock().await.contains(dir))
    }

    async fn record_processed(&self, dirs: &[PathBuf]) -> FsOpsResult<()> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.extend(dirs.iter().cloned());
        if entries.len() == before {
            return Ok(());
        }
        self.persist(&entries).await?;
        info!(
            path = %self.path.display(),
            added = entries.len() - before,
            "ledger updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    #[tokio::test]
    async fn noop_ledger_never_remembers() -> TestResult<()> {
        let ledger = NoopLedger;
        ledger.record_processed(&[PathBuf::from("/a")]).await?;
        assert!(!ledger.is_known_processed(Path::new("/a")).await?);
        Ok(())
    }

    #[tokio::test]
    async fn json_ledger_persists_between_opens() -> TestResult<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("state/ledger.json");

        let ledger = JsonLedger::open(&path).await?;
        assert!(!ledger.is_known_processed(Path::new("/lib/a")).await?);
        ledger
            .record_processed(&[PathBuf::from("/lib/b"), PathBuf::from("/lib/a")])
            .await?;
        assert!(ledger.is_known_processed(Path::new("/lib/a")).await?);

        let reopened = JsonLedger::open(&path).await?;
        assert_eq!(
            reopened.entries().await,
            vec![PathBuf::from("/lib/a"), PathBuf::from("/lib/b")]
        );
        assert!(!path.with_extension("json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn json_ledger_rejects_corrupt_documents() -> TestResult<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("ledger.json");
        std::fs::write(&path, b"{not json")?;
        let err = JsonLedger::open(&path).await;
        assert!(matches!(err, Err(FsOpsError::Json { .. })));

        std::fs::write(&path, br#"{"version": 9, "directories": []}"#)?;
        let err = JsonLedger::open(&path).await;
        assert!(matches!(
            err,
            Err(FsOpsError::InvalidInput {
                reason: "unsupported_version",
                ..
            })
        ));
        Ok(())
    }
}
