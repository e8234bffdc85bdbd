//! Service wiring for the curator binary.
//!
//! # Design
//! - Production collaborators are built here and nowhere else.
//! - Every failure is mapped into [`AppError`] with an operation label.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use curator_config::{ConfigOverrides, CuratorConfig};
use curator_events::EventBus;
use curator_fsops::{JsonLedger, LocalFs, NoopLedger, ProcessedLedger};
use curator_media::{FfprobeProbe, FrameDimensions, MediaProbe, ResolutionThreshold};
use curator_pipeline::{
    EventBusNotifier, FanoutNotifier, Notifier, PipelineState, ScannerWorkflow, Supervisor,
    SupervisorEvent, TracingNotifier, Trigger, WebhookNotifier, WorkflowDeps, WorkflowSettings,
};
use curator_telemetry::{LogFormat, LoggingConfig, Metrics};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Load configuration from `path`, the process environment, and CLI overrides.
///
/// # Errors
///
/// Returns [`AppError::Config`] when the document cannot be read or fails validation.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> AppResult<CuratorConfig> {
    curator_config::load(path, |name| std::env::var(name).ok(), overrides)
        .map_err(|err| AppError::config("config.load", err))
}

/// Install the tracing subscriber described by `config`.
///
/// # Errors
///
/// Returns [`AppError::Telemetry`] if a global subscriber is already installed.
pub fn init_telemetry(config: &CuratorConfig) -> AppResult<()> {
    let format = config
        .telemetry
        .log_format
        .as_deref()
        .and_then(|value| LogFormat::from_str(value).ok())
        .unwrap_or_else(LogFormat::infer);
    let logging = LoggingConfig {
        level: &config.telemetry.log_level,
        format,
        ..LoggingConfig::default()
    };
    curator_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))
}

/// Probe built from the evaluation settings.
#[must_use]
pub fn build_probe(config: &CuratorConfig) -> FfprobeProbe {
    FfprobeProbe::new(
        config.evaluation.probe_binary.clone(),
        Duration::from_secs(config.evaluation.probe_timeout_secs),
    )
}

/// Notifier fanning reports out to the bus, the log, and an optional webhook.
#[must_use]
pub fn build_notifier(config: &CuratorConfig, events: &EventBus) -> Arc<dyn Notifier> {
    let mut fanout = FanoutNotifier::new(vec![
        Arc::new(EventBusNotifier::new(events.clone())) as Arc<dyn Notifier>,
        Arc::new(TracingNotifier),
    ]);
    if let Some(url) = &config.notifier.webhook_url {
        fanout = fanout.with(Arc::new(WebhookNotifier::new(url.clone())));
    }
    Arc::new(fanout)
}

/// Open the configured ledger, or a pass-through one when none is configured.
///
/// # Errors
///
/// Returns [`AppError::FsOps`] when an existing ledger document cannot be read.
pub async fn build_ledger(config: &CuratorConfig) -> AppResult<Arc<dyn ProcessedLedger>> {
    match &config.scan.ledger_path {
        Some(path) => {
            let ledger = JsonLedger::open(path.clone())
                .await
                .map_err(|err| AppError::fsops("ledger.open", err))?;
            Ok(Arc::new(ledger))
        }
        None => Ok(Arc::new(NoopLedger)),
    }
}

/// Wire a workflow with production collaborators.
///
/// # Errors
///
/// Returns an error when the ledger cannot be opened or an exclude pattern is invalid.
pub async fn build_workflow(
    config: &CuratorConfig,
    events: EventBus,
    metrics: Metrics,
) -> AppResult<ScannerWorkflow> {
    let probe: Arc<dyn MediaProbe> = Arc::new(build_probe(config));
    build_workflow_with(config, events, metrics, probe).await
}

pub(crate) async fn build_workflow_with(
    config: &CuratorConfig,
    events: EventBus,
    metrics: Metrics,
    probe: Arc<dyn MediaProbe>,
) -> AppResult<ScannerWorkflow> {
    let ledger = build_ledger(config).await?;
    let notifier = build_notifier(config, &events);
    let deps = WorkflowDeps::new(Arc::new(LocalFs::new()), probe, events, metrics)
        .with_ledger(ledger)
        .with_notifier(notifier);
    ScannerWorkflow::new(WorkflowSettings::from_config(config), deps)
        .map_err(|err| AppError::workflow("workflow.new", err))
}

/// Outcome of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Identifier of the run.
    pub run_id: Uuid,
    /// State the workflow rested in afterwards.
    pub state: PipelineState,
    /// Files qualifying for relocation.
    pub qualifying: usize,
    /// Directories needing manual attention.
    pub reported: usize,
}

/// Drive one pipeline run through the supervisor.
///
/// When the run fails and `acknowledge` is set the failure is acknowledged and the
/// workflow returns to idle.
///
/// # Errors
///
/// Returns [`AppError::RunFailed`] when the run fails without acknowledgement, and
/// [`AppError::Workflow`] when the workflow rejects a trigger.
pub async fn run_once(workflow: ScannerWorkflow, acknowledge: bool) -> AppResult<RunSummary> {
    let mut supervisor = Supervisor::new(workflow);
    let state = supervisor
        .dispatch(SupervisorEvent::Pipeline(Trigger::StartScan))
        .await
        .map_err(|err| AppError::workflow("workflow.start_scan", err))?;

    if state == PipelineState::Idle {
        let run = supervisor
            .workflow()
            .last_run()
            .ok_or_else(|| {
                AppError::workflow(
                    "workflow.last_run",
                    curator_pipeline::WorkflowError::MissingContext { state },
                )
            })?;
        info!(run_id = %run.run_id, files = run.dirs_to_move.len(), "run finished");
        return Ok(RunSummary {
            run_id: run.run_id,
            state,
            qualifying: run.dirs_to_move.len(),
            reported: run.dirs_to_report.len(),
        });
    }

    let (run_id, message, reported) = supervisor.workflow().last_report().map_or_else(
        || (Uuid::nil(), String::from("unknown failure"), 0),
        |report| {
            (
                report.run_id,
                report.message.clone(),
                report.dirs_to_report.len(),
            )
        },
    );
    if !acknowledge {
        return Err(AppError::RunFailed { run_id, message });
    }

    warn!(%run_id, %message, "acknowledging failed run");
    let state = supervisor
        .dispatch(SupervisorEvent::Pipeline(Trigger::Restart))
        .await
        .map_err(|err| AppError::workflow("workflow.restart", err))?;
    Ok(RunSummary {
        run_id,
        state,
        qualifying: 0,
        reported,
    })
}

/// Probe `file` and report whether it clears `threshold`.
///
/// # Errors
///
/// Returns [`AppError::Probe`] when the probe fails.
pub async fn probe_file(
    probe: &dyn MediaProbe,
    file: &Path,
    threshold: ResolutionThreshold,
) -> AppResult<(FrameDimensions, bool)> {
    let dimensions = probe
        .probe(file)
        .await
        .map_err(|err| AppError::probe("probe.file", err))?;
    Ok((dimensions, threshold.is_exceeded_by(dimensions)))
}
