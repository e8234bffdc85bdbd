//! Error types for media probing.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Failures raised while reading frame dimensions.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe process could not be started.
    #[error("failed to spawn media probe")]
    Spawn {
        /// Probe executable.
        binary: String,
        /// Source IO error.
        source: io::Error,
    },
    /// The probe did not finish within its deadline.
    #[error("media probe timed out")]
    Timeout {
        /// File being probed.
        path: PathBuf,
        /// Deadline that elapsed.
        timeout: Duration,
    },
    /// The probe exited unsuccessfully.
    #[error("media probe exited with failure")]
    Failed {
        /// File being probed.
        path: PathBuf,
        /// Exit code when the process was not killed by a signal.
        status: Option<i32>,
    },
    /// The probe output was not the expected JSON document.
    #[error("failed to parse media probe output")]
    Parse {
        /// File being probed.
        path: PathBuf,
        /// Source JSON error.
        source: serde_json::Error,
    },
    /// The file has no video stream with dimensions.
    #[error("media has no video stream")]
    NoVideoStream {
        /// File being probed.
        path: PathBuf,
    },
}
