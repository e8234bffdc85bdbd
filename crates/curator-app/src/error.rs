//! # Design
//!
//! - Centralize application-level errors for bootstrap and command handling.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: curator_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: curator_telemetry::TelemetryError,
    },
    /// Filesystem or ledger operations failed.
    #[error("filesystem operation failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: curator_fsops::FsOpsError,
    },
    /// Media probing failed.
    #[error("media probe failed")]
    Probe {
        /// Operation identifier.
        operation: &'static str,
        /// Source probe error.
        source: curator_media::ProbeError,
    },
    /// The workflow refused a trigger or could not be built.
    #[error("workflow operation failed")]
    Workflow {
        /// Operation identifier.
        operation: &'static str,
        /// Source workflow error.
        source: curator_pipeline::WorkflowError,
    },
    /// IO operations failed.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Optional path involved in the failure.
        path: Option<PathBuf>,
        /// Source IO error.
        source: io::Error,
    },
    /// A pipeline run ended waiting for operator acknowledgement.
    #[error("pipeline run failed")]
    RunFailed {
        /// Identifier of the failed run.
        run_id: Uuid,
        /// Headline of the failure report.
        message: String,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: curator_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: curator_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn fsops(operation: &'static str, source: curator_fsops::FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    pub(crate) const fn probe(operation: &'static str, source: curator_media::ProbeError) -> Self {
        Self::Probe { operation, source }
    }

    pub(crate) const fn workflow(
        operation: &'static str,
        source: curator_pipeline::WorkflowError,
    ) -> Self {
        Self::Workflow { operation, source }
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::RunFailed { .. } => 1,
            Self::Config { .. } => 2,
            _ => 3,
        }
    }

    /// Message printed to stderr, including the source chain.
    #[must_use]
    pub fn display_message(&self) -> String {
        let mut message = self.to_string();
        match self {
            Self::RunFailed {
                run_id,
                message: detail,
            } => {
                let _ = write!(message, ": {detail} (run {run_id})");
                return message;
            }
            Self::Config {
                source:
                    curator_config::ConfigError::InvalidField {
                        section,
                        field,
                        reason,
                        ..
                    },
                ..
            } => {
                let _ = write!(message, ": {section}.{field}: {reason}");
                return message;
            }
            _ => {}
        }
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            let _ = write!(message, ": {err}");
            source = err.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_pipeline::{PipelineState, Trigger, WorkflowError};

    #[test]
    fn exit_codes_separate_config_from_run_failures() {
        let config = AppError::config(
            "load",
            curator_config::ConfigError::InvalidField {
                section: "library",
                field: "base_path",
                value: None,
                reason: "empty",
            },
        );
        assert_eq!(config.exit_code(), 2);
        assert_eq!(
            config.display_message(),
            "configuration operation failed: library.base_path: empty"
        );

        let failed = AppError::RunFailed {
            run_id: Uuid::nil(),
            message: "No files found to move".into(),
        };
        assert_eq!(failed.exit_code(), 1);
        assert!(failed.display_message().contains("No files found to move"));

        let workflow = AppError::workflow(
            "send",
            WorkflowError::TriggerRejected {
                trigger: Trigger::Restart,
                state: PipelineState::Idle,
            },
        );
        assert_eq!(workflow.exit_code(), 3);
    }

    #[test]
    fn display_message_walks_source_chain() {
        let err = AppError::Io {
            operation: "stdout.write",
            path: None,
            source: io::Error::other("pipe closed"),
        };
        assert_eq!(err.display_message(), "io operation failed: pipe closed");
    }
}
