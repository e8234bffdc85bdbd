//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters relevant to pipeline runs.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    runs_started_total: IntCounter,
    stage_outcomes_total: IntCounterVec,
    files_qualified_total: IntCounter,
    files_moved_total: IntCounter,
    files_skipped_total: IntCounter,
    reports_dispatched_total: IntCounter,
    triggers_rejected_total: IntCounter,
}

/// Snapshot of selected counters for status reporting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Pipeline runs started.
    pub runs_started_total: u64,
    /// Files classified as qualifying for relocation.
    pub files_qualified_total: u64,
    /// Files relocated into the destination library.
    pub files_moved_total: u64,
    /// Files skipped because they were already relocated.
    pub files_skipped_total: u64,
    /// Failure reports handed to the notifier.
    pub reports_dispatched_total: u64,
    /// Triggers rejected by the workflow.
    pub triggers_rejected_total: u64,
}

fn counter(name: &'static str, help: &'static str) -> Result<IntCounter> {
    IntCounter::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let runs_started_total =
            counter("curator_runs_started_total", "Pipeline runs started")?;
        let stage_outcomes_total = IntCounterVec::new(
            Opts::new(
                "curator_stage_outcomes_total",
                "Pipeline stage executions by outcome",
            ),
            &["stage", "outcome"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "curator_stage_outcomes_total",
            source,
        })?;
        let files_qualified_total = counter(
            "curator_files_qualified_total",
            "Files classified as qualifying for relocation",
        )?;
        let files_moved_total = counter(
            "curator_files_moved_total",
            "Files relocated into the destination library",
        )?;
        let files_skipped_total = counter(
            "curator_files_skipped_total",
            "Files skipped because the destination already existed",
        )?;
        let reports_dispatched_total = counter(
            "curator_reports_dispatched_total",
            "Failure reports dispatched to the notifier",
        )?;
        let triggers_rejected_total = counter(
            "curator_triggers_rejected_total",
            "Workflow triggers rejected in the current state",
        )?;

        register(&registry, "curator_runs_started_total", &runs_started_total)?;
        register(
            &registry,
            "curator_stage_outcomes_total",
            &stage_outcomes_total,
        )?;
        register(
            &registry,
            "curator_files_qualified_total",
            &files_qualified_total,
        )?;
        register(&registry, "curator_files_moved_total", &files_moved_total)?;
        register(&registry, "curator_files_skipped_total", &files_skipped_total)?;
        register(
            &registry,
            "curator_reports_dispatched_total",
            &reports_dispatched_total,
        )?;
        register(
            &registry,
            "curator_triggers_rejected_total",
            &triggers_rejected_total,
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                runs_started_total,
                stage_outcomes_total,
                files_qualified_total,
                files_moved_total,
                files_skipped_total,
                reports_dispatched_total,
                triggers_rejected_total,
            }),
        })
    }

    /// Increment the started-runs counter.
    pub fn inc_run_started(&self) {
        self.inner.runs_started_total.inc();
    }

    /// Increment the stage outcome counter (`outcome` is `success` or `failure`).
    pub fn inc_stage_outcome(&self, stage: &str, outcome: &str) {
        self.inner
            .stage_outcomes_total
            .with_label_values(&[stage, outcome])
            .inc();
    }

    /// Add to the qualifying-files counter.
    pub fn add_files_qualified(&self, count: usize) {
        self.inner.files_qualified_total.inc_by(as_u64(count));
    }

    /// Add to the moved/skipped file counters.
    pub fn add_files_relocated(&self, moved: usize, skipped: usize) {
        self.inner.files_moved_total.inc_by(as_u64(moved));
        self.inner.files_skipped_total.inc_by(as_u64(skipped));
    }

    /// Increment the dispatched-report counter.
    pub fn inc_report_dispatched(&self) {
        self.inner.reports_dispatched_total.inc();
    }

    /// Increment the rejected-trigger counter.
    pub fn inc_trigger_rejected(&self) {
        self.inner.triggers_rejected_total.inc();
    }

    /// Current value of a stage outcome counter.
    #[must_use]
    pub fn stage_outcome(&self, stage: &str, outcome: &str) -> u64 {
        self.inner
            .stage_outcomes_total
            .with_label_values(&[stage, outcome])
            .get()
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the pipeline counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_started_total: self.inner.runs_started_total.get(),
            files_qualified_total: self.inner.files_qualified_total.get(),
            files_moved_total: self.inner.files_moved_total.get(),
            files_skipped_total: self.inner.files_skipped_total.get(),
            reports_dispatched_total: self.inner.reports_dispatched_total.get(),
            triggers_rejected_total: self.inner.triggers_rejected_total.get(),
        }
    }
}

fn as_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}
