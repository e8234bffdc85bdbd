//! Failure reports and the notifiers that deliver them.
//!
//! # Design
//! - `FailureReport` is a serializable snapshot of the failure plus whatever the run
//!   had accumulated, so partial results reach the operator.
//! - Notifier errors are logged by the reporter and never change the workflow state.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use curator_events::{Event, EventBus, EventBusError};
use curator_telemetry::Metrics;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::context::RunContext;
use crate::error::{FileIssue, StageFailure};
use crate::state::Stage;

/// Operator-facing description of a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// Run that failed.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Stage that failed.
    pub stage: Stage,
    /// Headline message.
    pub message: String,
    /// Library root that was scanned.
    pub base_path: PathBuf,
    /// Library root files were relocated to.
    pub destination_path: PathBuf,
    /// Directories needing manual attention.
    pub dirs_to_report: Vec<PathBuf>,
    /// Item-level problems recorded during evaluation.
    pub file_issues: Vec<FileIssue>,
    /// The structured failure.
    pub failure: StageFailure,
}

impl FailureReport {
    /// Assemble a report from the run context at the moment of failure.
    #[must_use]
    pub fn build(context: &RunContext, stage: Stage, failure: &StageFailure) -> Self {
        let mut dirs_to_report = context.dirs_to_report.clone();
        let mut file_issues = context.file_issues.clone();
        if let StageFailure::NoQualifyingFiles {
            issues,
            unreadable_dirs,
        } = failure
        {
            dirs_to_report.extend(unreadable_dirs.iter().cloned());
            file_issues.extend(issues.iter().cloned());
        }
        dirs_to_report.sort();
        dirs_to_report.dedup();
        file_issues.sort();
        file_issues.dedup();

        Self {
            run_id: context.run_id,
            started_at: context.started_at,
            generated_at: Utc::now(),
            stage,
            message: failure.to_string(),
            base_path: context.base_path.clone(),
            destination_path: context.destination_path.clone(),
            dirs_to_report,
            file_issues,
            failure: failure.clone(),
        }
    }
}

/// Errors raised while delivering a report.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The report could not be serialized.
    #[error("failed to serialize failure report")]
    Serialize {
        /// Source JSON error.
        source: serde_json::Error,
    },
    /// The webhook request failed.
    #[error("webhook delivery failed")]
    Http {
        /// Endpoint that was called.
        url: String,
        /// Source HTTP error.
        source: reqwest::Error,
    },
    /// One or more fan-out targets failed.
    #[error("some notifiers failed")]
    Fanout {
        /// Number of failed targets.
        failed: usize,
        /// Number of targets attempted.
        attempted: usize,
    },
}

/// Sink for failure reports.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `report`.
    async fn report(&self, report: &FailureReport) -> Result<(), NotifyError>;
}

/// Publishes reports on the event bus as [`Event::ErrorsReported`].
#[derive(Clone)]
pub struct EventBusNotifier {
    events: EventBus,
}

impl EventBusNotifier {
    /// Publish through `events`.
    #[must_use]
    pub const fn new(events: EventBus) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Notifier for EventBusNotifier {
    async fn report(&self, report: &FailureReport) -> Result<(), NotifyError> {
        let payload =
            serde_json::to_value(report).map_err(|source| NotifyError::Serialize { source })?;
        let event = Event::ErrorsReported {
            run_id: report.run_id,
            message: report.message.clone(),
            report: payload,
        };
        // The event stays in the replay ring even without live subscribers.
        if let Err(EventBusError::NoSubscribers { event_id, .. }) = self.events.publish(event) {
            info!(event_id, "failure report buffered without live subscribers");
        }
        Ok(())
    }
}

/// Writes reports to the log at `error` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn report(&self, report: &FailureReport) -> Result<(), NotifyError> {
        let payload =
            serde_json::to_string(report).map_err(|source| NotifyError::Serialize { source })?;
        error!(
            run_id = %report.run_id,
            stage = report.stage.as_str(),
            kind = report.failure.kind(),
            dirs_to_report = report.dirs_to_report.len(),
            report = %payload,
            "{}",
            report.message
        );
        Ok(())
    }
}

/// Posts reports as JSON to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Post to `url` with a default client.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Post to `url` with a caller-supplied client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Endpoint receiving reports.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn report(&self, report: &FailureReport) -> Result<(), NotifyError> {
        self.client
            .post(&self.url)
            .json(report)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|source| NotifyError::Http {
                url: self.url.clone(),
                source,
            })?;
        Ok(())
    }
}

/// Delivers every report to each inner notifier, even when one fails.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    targets: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    /// Fan out to `targets`.
    #[must_use]
    pub fn new(targets: Vec<Arc<dyn Notifier>>) -> Self {
        Self { targets }
    }

    /// Add a target.
    #[must_use]
    pub fn with(mut self, target: Arc<dyn Notifier>) -> Self {
        self.targets.push(target);
        self
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether there are no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn report(&self, report: &FailureReport) -> Result<(), NotifyError> {
        let mut failed = 0usize;
        for target in &self.targets {
            if let Err(err) = target.report(report).await {
                warn!(error = %err, run_id = %report.run_id, "notifier failed");
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(NotifyError::Fanout {
                failed,
                attempted: self.targets.len(),
            });
        }
        Ok(())
    }
}

/// Builds reports on entry to `reporting_errors` and hands them to the notifier.
#[derive(Clone)]
pub struct ErrorReporter {
    notifier: Arc<dyn Notifier>,
    metrics: Metrics,
}

impl ErrorReporter {
    /// Report through `notifier`, counting dispatches in `metrics`.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, metrics: Metrics) -> Self {
        Self { notifier, metrics }
    }

    /// Build and deliver a report. Delivery failures are logged and swallowed.
    pub async fn dispatch(
        &self,
        context: &RunContext,
        stage: Stage,
        failure: &StageFailure,
    ) -> FailureReport {
        let report = FailureReport::build(context, stage, failure);
        match self.notifier.report(&report).await {
            Ok(()) => self.metrics.inc_report_dispatched(),
            Err(err) => {
                error!(error = %err, run_id = %report.run_id, "failed to deliver failure report");
            }
        }
        report
    }
}
