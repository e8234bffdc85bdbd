//! Default values for configuration documents.
//!
//! # Design
//! - Centralize defaults so serde, validation, and docs stay consistent.
//! - Keep the resolution threshold explicit; it is exclusive on both axes.

/// Extensions relocated when the configuration does not override them.
pub const DEFAULT_ACCEPTED_FILE_TYPES: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "m4v", "mpg", "mpeg", "wmv", "flv", "ts", "mts",
];
/// Width a file must exceed to qualify.
pub const DEFAULT_MIN_WIDTH: u32 = 1920;
/// Height a file must exceed to qualify.
pub const DEFAULT_MIN_HEIGHT: u32 = 1080;
/// Binary used to probe media dimensions.
pub const DEFAULT_PROBE_BINARY: &str = "ffprobe";
/// Upper bound on a single probe invocation.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 30;
/// Fan-out bound applied to each stage when unset.
pub const DEFAULT_STAGE_CONCURRENCY: usize = 8;
/// Log level used when neither config nor `RUST_LOG` provide one.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Glob preset expanding to common non-feature directories.
pub const SKIP_FLUFF_PRESET: &str = "@skip_fluff";
/// Patterns the [`SKIP_FLUFF_PRESET`] expands to.
pub const SKIP_FLUFF_PATTERNS: &[&str] = &[
    "**/sample",
    "**/samples",
    "**/extras",
    "**/proof",
    "**/screens",
];

pub(crate) fn accepted_file_types() -> Vec<String> {
    DEFAULT_ACCEPTED_FILE_TYPES
        .iter()
        .map(ToString::to_string)
        .collect()
}

pub(crate) const fn min_width() -> u32 {
    DEFAULT_MIN_WIDTH
}

pub(crate) const fn min_height() -> u32 {
    DEFAULT_MIN_HEIGHT
}

pub(crate) fn probe_binary() -> String {
    DEFAULT_PROBE_BINARY.to_string()
}

pub(crate) const fn probe_timeout_secs() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

pub(crate) const fn stage_concurrency() -> usize {
    DEFAULT_STAGE_CONCURRENCY
}

pub(crate) fn log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
