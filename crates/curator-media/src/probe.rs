//! Frame dimension probing.
//!
//! # Design
//! - `MediaProbe` is the seam the evaluator uses; the production adapter shells out to
//!   `ffprobe` and reads the first video stream only.
//! - Each invocation is bounded by a timeout and the child is killed when dropped.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::error::{ProbeError, ProbeResult};

/// Width and height of a video stream in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameDimensions {
    /// Horizontal resolution.
    pub width: u32,
    /// Vertical resolution.
    pub height: u32,
}

impl FrameDimensions {
    /// Construct dimensions from a width and height.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for FrameDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Exclusive lower bound a file's dimensions must exceed on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionThreshold {
    /// Width that must be exceeded.
    pub width: u32,
    /// Height that must be exceeded.
    pub height: u32,
}

impl ResolutionThreshold {
    /// 1080p, the default bound.
    pub const FULL_HD: Self = Self {
        width: 1920,
        height: 1080,
    };

    /// Construct a threshold.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether `dimensions` strictly exceed the threshold on both axes.
    #[must_use]
    pub const fn is_exceeded_by(self, dimensions: FrameDimensions) -> bool {
        dimensions.width > self.width && dimensions.height > self.height
    }
}

impl Default for ResolutionThreshold {
    fn default() -> Self {
        Self::FULL_HD
    }
}

/// Source of frame dimensions for media files.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Read the dimensions of the first video stream in `path`.
    async fn probe(&self, path: &Path) -> ProbeResult<FrameDimensions>;
}

/// [`MediaProbe`] backed by the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: String,
    timeout: Duration,
}

impl FfprobeProbe {
    /// Build a probe invoking `binary` with the given per-file deadline.
    #[must_use]
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Executable the probe invokes.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    #[instrument(name = "media.probe", skip(self, path), fields(path = %path.display()))]
    async fn probe(&self, path: &Path) -> ProbeResult<FrameDimensions> {
        let child = Command::new(&self.binary)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProbeError::Timeout {
                path: path.to_path_buf(),
                timeout: self.timeout,
            })?
            .map_err(|source| ProbeError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                path: path.to_path_buf(),
                status: output.status.code(),
            });
        }

        let dimensions = parse_dimensions(&output.stdout, path)?;
        debug!(%dimensions, "probed frame dimensions");
        Ok(dimensions)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeDocument {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Extract the first stream's dimensions from `ffprobe -print_format json` output.
///
/// # Errors
///
/// Returns [`ProbeError::Parse`] for malformed JSON and
/// [`ProbeError::NoVideoStream`] when no stream carries both dimensions.
pub fn parse_dimensions(stdout: &[u8], path: &Path) -> ProbeResult<FrameDimensions> {
    let document: ProbeDocument =
        serde_json::from_slice(stdout).map_err(|source| ProbeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    document
        .streams
        .into_iter()
        .find_map(|stream| Some(FrameDimensions::new(stream.width?, stream.height?)))
        .ok_or_else(|| ProbeError::NoVideoStream {
            path: PathBuf::from(path),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    #[test]
    fn threshold_is_strict_on_both_axes() {
        let threshold = ResolutionThreshold::default();
        assert!(threshold.is_exceeded_by(FrameDimensions::new(3840, 2160)));
        assert!(!threshold.is_exceeded_by(FrameDimensions::new(1920, 1080)));
        assert!(!threshold.is_exceeded_by(FrameDimensions::new(3840, 1080)));
        assert!(!threshold.is_exceeded_by(FrameDimensions::new(1920, 2160)));
        assert!(threshold.is_exceeded_by(FrameDimensions::new(1921, 1081)));
    }

    #[test]
    fn parses_first_video_stream() -> TestResult<()> {
        let json = br#"{"streams":[{"index":0,"codec_type":"video","width":3840,"height":2160}]}"#;
        let dims = parse_dimensions(json, Path::new("movie.mkv"))?;
        assert_eq!(dims, FrameDimensions::new(3840, 2160));
        assert_eq!(dims.to_string(), "3840x2160");
        Ok(())
    }

    #[test]
    fn missing_streams_and_garbage_are_errors() {
        let path = Path::new("audio.mka");
        assert!(matches!(
            parse_dimensions(br#"{"streams":[]}"#, path),
            Err(ProbeError::NoVideoStream { .. })
        ));
        assert!(matches!(
            parse_dimensions(br#"{"streams":[{"width":640}]}"#, path),
            Err(ProbeError::NoVideoStream { .. })
        ));
        assert!(matches!(
            parse_dimensions(b"", path),
            Err(ProbeError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let probe = FfprobeProbe::new("curator-no-such-ffprobe", Duration::from_secs(1));
        let err = probe.probe(Path::new("movie.mkv")).await;
        assert!(matches!(err, Err(ProbeError::Spawn { .. })));
    }

    #[tokio::test]
    async fn failing_binary_reports_exit_status() {
        let probe = FfprobeProbe::new("false", Duration::from_secs(5));
        let err = probe.probe(Path::new("movie.mkv")).await;
        assert!(matches!(
            err,
            Err(ProbeError::Failed {
                status: Some(1),
                ..
            })
        ));
    }
}
