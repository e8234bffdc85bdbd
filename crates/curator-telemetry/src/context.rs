//! Context propagation helpers for application and run spans.
//!
//! # Design
//! - Keeps the active run identifier in task-local storage so collaborators can tag their logs.
//! - Provides an application-level span guard to ensure top-level spans carry mode/build info.

use std::future::Future;

use tracing::{Span, span::Entered};
use uuid::Uuid;

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    #[must_use]
    /// Enter the application-level tracing span for the lifetime of the guard.
    pub fn new(mode: impl Into<String>) -> Self {
        let mode = mode.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", mode = %mode, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Record the current application mode on the active span.
pub fn record_app_mode(mode: &str) {
    Span::current().record("mode", tracing::field::display(mode));
}

/// Retrieve the identifier of the pipeline run driving the current task, if any.
#[must_use]
pub fn current_run_id() -> Option<Uuid> {
    ACTIVE_RUN.try_with(|run_id| *run_id).ok()
}

/// Execute the provided future with the run identifier available to downstream code.
pub async fn with_run_context<Fut, T>(run_id: Uuid, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    ACTIVE_RUN.scope(run_id, fut).await
}

tokio::task_local! {
    static ACTIVE_RUN: Uuid;
}
