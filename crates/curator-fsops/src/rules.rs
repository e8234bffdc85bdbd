//! Glob rules excluding directories from a scan.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::{FsOpsError, FsOpsResult};

/// Compiled exclude patterns.
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    set: Option<GlobSet>,
}

impl ExcludeRules {
    /// Compile `patterns`; an empty list excludes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::InvalidInput`] for blank patterns and
    /// [`FsOpsError::Glob`] for patterns globset rejects.
    pub fn new<I, S>(patterns: I) -> FsOpsResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut count = 0usize;
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if pattern.trim().is_empty() {
                return Err(FsOpsError::InvalidInput {
                    field: "exclude_patterns",
                    reason: "empty_pattern",
                    value: Some(pattern.to_string()),
                });
            }
            builder.add(
                Glob::new(pattern).map_err(|source| {
                    FsOpsError::glob("exclude_rules.compile", pattern.to_string(), source)
                })?,
            );
            count += 1;
        }
        if count == 0 {
            return Ok(Self::default());
        }
        let set = builder.build().map_err(|source| {
            FsOpsError::glob("exclude_rules.build", "<set>".to_string(), source)
        })?;
        Ok(Self { set: Some(set) })
    }

    /// Whether `dir` (or its path relative to `base`) matches any pattern.
    #[must_use]
    pub fn is_excluded(&self, dir: &Path, base: &Path) -> bool {
        let Some(set) = &self.set else {
            return false;
        };
        let relative = dir.strip_prefix(base).unwrap_or(dir);
        set.is_match(relative) || set.is_match(dir)
    }

    /// Number of compiled patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.as_ref().map_or(0, GlobSet::len)
    }

    /// Whether no patterns were compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_nested_fluff_directories() -> FsOpsResult<()> {
        let rules = ExcludeRules::new(["**/sample", "**/extras"])?;
        let base = Path::new("/lib/incoming");
        assert!(rules.is_excluded(Path::new("/lib/incoming/Movie/sample"), base));
        assert!(rules.is_excluded(Path::new("/lib/incoming/extras"), base));
        assert!(!rules.is_excluded(Path::new("/lib/incoming/Movie"), base));
        assert_eq!(rules.len(), 2);
        Ok(())
    }

    #[test]
    fn empty_rules_exclude_nothing() -> FsOpsResult<()> {
        let rules = ExcludeRules::new(Vec::<String>::new())?;
        assert!(rules.is_empty());
        assert!(!rules.is_excluded(Path::new("/any"), Path::new("/")));
        Ok(())
    }

    #[test]
    fn rejects_blank_and_malformed_patterns() {
        assert!(matches!(
            ExcludeRules::new(["  "]),
            Err(FsOpsError::InvalidInput { .. })
        ));
        assert!(matches!(
            ExcludeRules::new(["["]),
            Err(FsOpsError::Glob { .. })
        ));
    }
}
