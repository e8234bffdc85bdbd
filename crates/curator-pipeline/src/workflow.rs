//! The scanner workflow controller.
//!
//! # Design
//! - `send` takes `&mut self`, so one stage runs at a time and a run context is never
//!   shared.
//! - Each stage state invokes exactly one actor, folds the result into the context
//!   per the transition table, then enters the next state.
//! - Entering `reporting_errors` dispatches a failure report; the workflow then
//!   waits for `RESTART`.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use curator_config::{ConcurrencyConfig, CuratorConfig};
use curator_events::{Event, EventBus};
use curator_fsops::{ExcludeRules, LibraryFs, NoopLedger, ProcessedLedger};
use curator_media::{MediaProbe, ResolutionThreshold};
use curator_telemetry::{Metrics, with_run_context};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::context::RunContext;
use crate::error::{StageFailure, WorkflowError, WorkflowResult};
use crate::reporter::{ErrorReporter, EventBusNotifier, FailureReport, Notifier};
use crate::stages::{
    EvaluationRules, ScanRules, StageOutput, StageResult, check_permissions, evaluate, relocate,
    scan,
};
use crate::state::{MergePolicy, Outcome, PipelineState, Stage, Trigger, accept, transition};

/// Static inputs of every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Root scanned for candidate directories.
    pub base_path: PathBuf,
    /// Root qualifying files are relocated beneath.
    pub destination_path: PathBuf,
    /// Case-sensitive extensions eligible for relocation.
    pub accepted_file_types: BTreeSet<String>,
    /// Bound probed dimensions must exceed.
    pub threshold: ResolutionThreshold,
    /// Descend below the first directory level when scanning.
    pub recursive: bool,
    /// Glob patterns for directories never scanned.
    pub exclude_patterns: Vec<String>,
    /// Per-stage fan-out bounds.
    pub concurrency: ConcurrencyConfig,
}

impl WorkflowSettings {
    /// Settings for `base_path` and `destination_path` with every other value defaulted.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>, destination_path: impl Into<PathBuf>) -> Self {
        let mut config = CuratorConfig::default();
        config.library.base_path = base_path.into();
        config.library.destination_path = destination_path.into();
        Self::from_config(&config)
    }

    /// Derive settings from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &CuratorConfig) -> Self {
        Self {
            base_path: config.library.base_path.clone(),
            destination_path: config.library.destination_path.clone(),
            accepted_file_types: config.library.accepted_file_types.iter().cloned().collect(),
            threshold: ResolutionThreshold::new(
                config.evaluation.min_width,
                config.evaluation.min_height,
            ),
            recursive: config.scan.recursive,
            exclude_patterns: config.scan.expanded_exclude_patterns(),
            concurrency: config.concurrency,
        }
    }
}

/// Collaborators the workflow drives.
#[derive(Clone)]
pub struct WorkflowDeps {
    /// Filesystem access.
    pub fs: Arc<dyn LibraryFs>,
    /// Frame dimension probe.
    pub probe: Arc<dyn MediaProbe>,
    /// Processed directory ledger.
    pub ledger: Arc<dyn ProcessedLedger>,
    /// Failure report sink.
    pub notifier: Arc<dyn Notifier>,
    /// Event bus for lifecycle events.
    pub events: EventBus,
    /// Metrics registry.
    pub metrics: Metrics,
}

impl WorkflowDeps {
    /// Dependencies with no ledger and reports published on `events`.
    #[must_use]
    pub fn new(
        fs: Arc<dyn LibraryFs>,
        probe: Arc<dyn MediaProbe>,
        events: EventBus,
        metrics: Metrics,
    ) -> Self {
        Self {
            fs,
            probe,
            ledger: Arc::new(NoopLedger),
            notifier: Arc::new(EventBusNotifier::new(events.clone())),
            events,
            metrics,
        }
    }

    /// Replace the ledger.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<dyn ProcessedLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Replace the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

/// Finite-state controller sequencing scan, permission, evaluation, and move stages.
pub struct ScannerWorkflow {
    settings: WorkflowSettings,
    scan_rules: ScanRules,
    deps: WorkflowDeps,
    reporter: ErrorReporter,
    state: PipelineState,
    context: Option<RunContext>,
    last_run: Option<RunContext>,
    last_report: Option<FailureReport>,
    last_failure: Option<StageFailure>,
    processed_history: Vec<PathBuf>,
}

impl ScannerWorkflow {
    /// Build an idle workflow.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidSettings`] when an exclude pattern does not compile.
    pub fn new(settings: WorkflowSettings, deps: WorkflowDeps) -> WorkflowResult<Self> {
        let exclude = ExcludeRules::new(&settings.exclude_patterns)
            .map_err(|source| WorkflowError::InvalidSettings { source })?;
        let scan_rules = ScanRules {
            recursive: settings.recursive,
            exclude,
        };
        let reporter = ErrorReporter::new(Arc::clone(&deps.notifier), deps.metrics.clone());
        Ok(Self {
            settings,
            scan_rules,
            deps,
            reporter,
            state: PipelineState::Idle,
            context: None,
            last_run: None,
            last_report: None,
            last_failure: None,
            processed_history: Vec::new(),
        })
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> PipelineState {
        self.state
    }

    /// Context of the active or failed run.
    #[must_use]
    pub const fn context(&self) -> Option<&RunContext> {
        self.context.as_ref()
    }

    /// Context of the most recently archived run.
    #[must_use]
    pub const fn last_run(&self) -> Option<&RunContext> {
        self.last_run.as_ref()
    }

    /// Report produced by the most recent failure.
    #[must_use]
    pub const fn last_report(&self) -> Option<&FailureReport> {
        self.last_report.as_ref()
    }

    /// Most recent stage failure.
    #[must_use]
    pub const fn last_failure(&self) -> Option<&StageFailure> {
        self.last_failure.as_ref()
    }

    /// Files relocated by completed runs; seeds each new run.
    #[must_use]
    pub fn processed_files(&self) -> &[PathBuf] {
        &self.processed_history
    }

    /// Static run inputs.
    #[must_use]
    pub const fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Bus lifecycle events are published on.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.deps.events
    }

    /// Metrics registry.
    #[must_use]
    pub const fn metrics(&self) -> &Metrics {
        &self.deps.metrics
    }

    /// Apply `trigger` and drive the pipeline to the next quiescent state.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TriggerRejected`] when the current state does not
    /// accept `trigger`. Stage failures are not errors; they leave the workflow in
    /// [`PipelineState::ReportingErrors`].
    pub async fn send(&mut self, trigger: Trigger) -> WorkflowResult<PipelineState> {
        let Some(next) = accept(self.state, trigger) else {
            return Err(WorkflowError::TriggerRejected {
                trigger,
                state: self.state,
            });
        };

        match trigger {
            Trigger::StartScan => {
                let context = RunContext::new(
                    self.settings.base_path.clone(),
                    self.settings.destination_path.clone(),
                    self.settings.accepted_file_types.clone(),
                    self.processed_history.clone(),
                );
                let run_id = context.run_id;
                self.context = Some(context);
                self.last_report = None;
                self.last_failure = None;
                self.deps.metrics.inc_run_started();
                self.publish(Event::RunStarted {
                    run_id,
                    base_path: self.settings.base_path.display().to_string(),
                });
                info!(%run_id, base_path = %self.settings.base_path.display(), "pipeline run started");
                self.enter(next, run_id);

                let span = info_span!("pipeline.run", %run_id);
                with_run_context(run_id, self.drive().instrument(span)).await?;
            }
            Trigger::Restart => {
                let run_id = self.context.as_ref().map_or_else(Uuid::nil, |ctx| ctx.run_id);
                self.publish(Event::RunAcknowledged { run_id });
                info!(%run_id, "failed run acknowledged");
                self.last_run = self.context.take();
                self.enter(next, run_id);
            }
        }
        Ok(self.state)
    }

    async fn drive(&mut self) -> WorkflowResult<()> {
        while let Some(stage) = self.state.stage() {
            let context = self
                .context
                .take()
                .ok_or(WorkflowError::MissingContext { state: self.state })?;
            let run_id = context.run_id;

            debug!(stage = stage.as_str(), "stage started");
            let result = self.run_stage(stage, &context).await;
            let outcome = if result.is_ok() {
                Outcome::Success
            } else {
                Outcome::Failure
            };
            self.deps
                .metrics
                .inc_stage_outcome(stage.as_str(), outcome.as_str());

            let Some(row) = transition(self.state, outcome) else {
                self.context = Some(context);
                return Err(WorkflowError::MissingTransition {
                    state: self.state,
                    outcome: outcome.as_str(),
                });
            };

            let context = match (&result, row.merge) {
                (Ok(output), MergePolicy::Output) => context.merge(output),
                (Err(failure), MergePolicy::Failure) => context.merge_failure(failure),
                _ => context,
            };

            match result {
                Ok(output) => {
                    self.record_success(stage, run_id, &output);
                    self.context = Some(context);
                    self.enter(row.to, run_id);
                    if row.to == PipelineState::Idle {
                        self.complete_run().await;
                    }
                }
                Err(failure) => {
                    self.record_failure(stage, run_id, &failure);
                    self.enter(row.to, run_id);
                    let report = self.reporter.dispatch(&context, stage, &failure).await;
                    self.context = Some(context);
                    self.last_report = Some(report);
                    self.last_failure = Some(failure);
                }
            }
        }
        Ok(())
    }

    async fn run_stage(&self, stage: Stage, context: &RunContext) -> StageResult {
        let fs = self.deps.fs.as_ref();
        let concurrency = self.settings.concurrency;
        match stage {
            Stage::Scan => {
                scan(
                    fs,
                    self.deps.ledger.as_ref(),
                    &self.scan_rules,
                    &context.base_path,
                )
                .await
            }
            Stage::Permissions => {
                check_permissions(
                    fs,
                    &context.directories_to_check,
                    concurrency.permission_checks,
                )
                .await
            }
            Stage::Evaluate => {
                let rules = EvaluationRules {
                    accepted_file_types: context.accepted_file_types.clone(),
                    threshold: self.settings.threshold,
                };
                evaluate(
                    fs,
                    self.deps.probe.as_ref(),
                    &context.dirs_to_evaluate,
                    &rules,
                    concurrency.evaluations,
                )
                .await
            }
            Stage::Move => {
                relocate(
                    fs,
                    &context.dirs_to_move,
                    &context.base_path,
                    &context.destination_path,
                    &context.processed_files,
                    concurrency.moves,
                )
                .await
            }
        }
    }

    fn record_success(&self, stage: Stage, run_id: Uuid, output: &StageOutput) {
        let detail = output.summary();
        info!(stage = stage.as_str(), %detail, "stage completed");
        match output {
            StageOutput::Evaluated { qualifying, .. } => {
                self.deps.metrics.add_files_qualified(qualifying.len());
            }
            StageOutput::Moved { moved, skipped } => {
                self.deps
                    .metrics
                    .add_files_relocated(moved.len(), skipped.len());
                self.publish(Event::FilesRelocated {
                    run_id,
                    moved: moved.len(),
                    skipped: skipped.len(),
                });
            }
            StageOutput::Scanned { .. } | StageOutput::Checked { .. } => {}
        }
        self.publish(Event::StageCompleted {
            run_id,
            stage: stage.as_str().to_string(),
            detail,
        });
    }

    fn record_failure(&self, stage: Stage, run_id: Uuid, failure: &StageFailure) {
        warn!(
            stage = stage.as_str(),
            kind = failure.kind(),
            "stage failed: {failure}"
        );
        self.publish(Event::StageFailed {
            run_id,
            stage: stage.as_str().to_string(),
            kind: failure.kind().to_string(),
            message: failure.to_string(),
        });
    }

    async fn complete_run(&mut self) {
        let Some(context) = self.context.take() else {
            return;
        };
        let completed = context.completed_directories();
        if let Err(err) = self.deps.ledger.record_processed(&completed).await {
            warn!(error = %err, "failed to record processed directories");
        }
        self.processed_history.clone_from(&context.processed_files);
        self.publish(Event::RunCompleted {
            run_id: context.run_id,
        });
        info!(
            run_id = %context.run_id,
            directories = completed.len(),
            files = context.dirs_to_move.len(),
            "pipeline run completed"
        );
        self.last_run = Some(context);
    }

    fn enter(&mut self, to: PipelineState, run_id: Uuid) {
        let from = self.state;
        self.state = to;
        debug!(from = from.as_str(), to = to.as_str(), "state changed");
        self.publish(Event::StateChanged {
            run_id,
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        });
    }

    fn publish(&self, event: Event) {
        if let Err(error) = self.deps.events.publish(event) {
            debug!(
                event_id = error.event_id(),
                event_kind = error.event_kind(),
                "event buffered without live subscribers"
            );
        }
    }
}
