//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers deserialized from YAML and adjusted by overrides.
//! - Every section defaults, so a document only needs the library paths.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::{self, SKIP_FLUFF_PATTERNS, SKIP_FLUFF_PRESET};

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CuratorConfig {
    /// Source and destination library settings.
    #[serde(default)]
    pub library: LibraryConfig,
    /// Directory discovery settings.
    #[serde(default)]
    pub scan: ScanConfig,
    /// File classification settings.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Per-stage fan-out bounds.
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    /// Logging settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Failure notification settings.
    #[serde(default)]
    pub notifier: NotifierConfig,
}

/// Library roots and the extension allow-list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// Root directory scanned for candidate directories.
    #[serde(default)]
    pub base_path: PathBuf,
    /// Root directory qualifying files are relocated beneath.
    #[serde(default)]
    pub destination_path: PathBuf,
    /// Case-sensitive extensions (without the leading dot) eligible for relocation.
    #[serde(default = "defaults::accepted_file_types")]
    pub accepted_file_types: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::new(),
            destination_path: PathBuf::new(),
            accepted_file_types: defaults::accepted_file_types(),
        }
    }
}

/// Directory discovery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Descend into nested directories instead of listing only the first level.
    #[serde(default)]
    pub recursive: bool,
    /// Glob patterns for directories that are never scanned.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// JSON ledger of directories processed by earlier runs.
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,
}

impl ScanConfig {
    /// Exclude patterns with the `@skip_fluff` preset expanded.
    #[must_use]
    pub fn expanded_exclude_patterns(&self) -> Vec<String> {
        let mut patterns = Vec::with_capacity(self.exclude_patterns.len());
        for pattern in &self.exclude_patterns {
            if pattern == SKIP_FLUFF_PRESET {
                patterns.extend(SKIP_FLUFF_PATTERNS.iter().map(ToString::to_string));
            } else {
                patterns.push(pattern.clone());
            }
        }
        patterns.sort();
        patterns.dedup();
        patterns
    }
}

/// File classification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Width a file must strictly exceed.
    #[serde(default = "defaults::min_width")]
    pub min_width: u32,
    /// Height a file must strictly exceed.
    #[serde(default = "defaults::min_height")]
    pub min_height: u32,
    /// Probe executable name or path.
    #[serde(default = "defaults::probe_binary")]
    pub probe_binary: String,
    /// Timeout applied to each probe invocation, in seconds.
    #[serde(default = "defaults::probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl EvaluationConfig {
    /// Probe timeout as a [`Duration`].
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            min_width: defaults::min_width(),
            min_height: defaults::min_height(),
            probe_binary: defaults::probe_binary(),
            probe_timeout_secs: defaults::probe_timeout_secs(),
        }
    }
}

/// Fan-out bounds for the item-level work inside each stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConcurrencyConfig {
    /// Concurrent directory access probes.
    #[serde(default = "defaults::stage_concurrency")]
    pub permission_checks: usize,
    /// Concurrent directory evaluations.
    #[serde(default = "defaults::stage_concurrency")]
    pub evaluations: usize,
    /// Concurrent file relocations.
    #[serde(default = "defaults::stage_concurrency")]
    pub moves: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            permission_checks: defaults::stage_concurrency(),
            evaluations: defaults::stage_concurrency(),
            moves: defaults::stage_concurrency(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Level passed to the env filter when `RUST_LOG` is unset.
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    /// `json` or `pretty`; inferred from the build profile when unset.
    #[serde(default)]
    pub log_format: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level(),
            log_format: None,
        }
    }
}

/// Failure notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NotifierConfig {
    /// Endpoint receiving failure reports as JSON `POST` bodies.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Values supplied on the command line; `None` leaves the loaded value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Replacement base path.
    pub base_path: Option<PathBuf>,
    /// Replacement destination path.
    pub destination_path: Option<PathBuf>,
    /// Replacement log format.
    pub log_format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_fluff_preset_expands_and_dedups() {
        let scan = ScanConfig {
            exclude_patterns: vec![
                SKIP_FLUFF_PRESET.to_string(),
                "**/extras".to_string(),
                "**/trailers".to_string(),
            ],
            ..ScanConfig::default()
        };
        let patterns = scan.expanded_exclude_patterns();
        assert!(patterns.contains(&"**/trailers".to_string()));
        assert!(patterns.contains(&"**/sample".to_string()));
        assert_eq!(
            patterns.iter().filter(|p| p.as_str() == "**/extras").count(),
            1
        );
        assert!(!patterns.contains(&SKIP_FLUFF_PRESET.to_string()));
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = CuratorConfig::default();
        assert_eq!(config.library.accepted_file_types.len(), 11);
        assert_eq!(config.evaluation.min_width, 1920);
        assert_eq!(config.evaluation.min_height, 1080);
        assert_eq!(config.evaluation.probe_timeout(), Duration::from_secs(30));
        assert_eq!(config.concurrency.moves, 8);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.notifier.webhook_url.is_none());
    }
}
