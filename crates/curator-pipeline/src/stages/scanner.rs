//! Directory discovery.

use std::path::Path;

use curator_fsops::{ExcludeRules, LibraryFs, ProcessedLedger};
use tracing::{debug, warn};

use crate::context::normalized;
use crate::error::StageFailure;
use crate::stages::{StageOutput, StageResult};

/// How candidate directories are discovered.
#[derive(Debug, Clone, Default)]
pub struct ScanRules {
    /// Descend below the first level.
    pub recursive: bool,
    /// Directories never scanned.
    pub exclude: ExcludeRules,
}

/// Enumerate candidate directories beneath `base`.
///
/// Excluded directories (and anything beneath them) and directories the ledger
/// already knows are dropped. An unreadable base or an empty result fails with
/// [`StageFailure::NoDirectoriesFound`].
pub async fn scan(
    fs: &dyn LibraryFs,
    ledger: &dyn ProcessedLedger,
    rules: &ScanRules,
    base: &Path,
) -> StageResult {
    let listed = match fs.list_directories(base, rules.recursive).await {
        Ok(listed) => listed,
        Err(err) => {
            warn!(base = %base.display(), error = %err, "failed to list base path");
            return Err(StageFailure::NoDirectoriesFound {
                reason: Some(err.to_string()),
            });
        }
    };

    let mut directories = Vec::with_capacity(listed.len());
    for dir in listed {
        if is_excluded(&rules.exclude, &dir, base) {
            debug!(dir = %dir.display(), "directory excluded by pattern");
            continue;
        }
        match ledger.is_known_processed(&dir).await {
            Ok(true) => {
                debug!(dir = %dir.display(), "directory already processed");
                continue;
            }
            Ok(false) => {}
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "ledger lookup failed; scanning anyway");
            }
        }
        directories.push(dir);
    }

    if directories.is_empty() {
        return Err(StageFailure::NoDirectoriesFound { reason: None });
    }
    Ok(StageOutput::Scanned {
        directories: normalized(directories),
    })
}

fn is_excluded(rules: &ExcludeRules, dir: &Path, base: &Path) -> bool {
    if rules.is_empty() {
        return false;
    }
    dir.ancestors()
        .take_while(|ancestor| *ancestor != base && ancestor.starts_with(base))
        .any(|ancestor| rules.is_excluded(ancestor, base))
}
