#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::redundant_pub_crate)]

//! Scanner workflow for media library curation.
//!
//! Layout: `state.rs` (states, triggers, transition table), `context.rs` (run
//! context and merges), `stages/` (scan, permissions, evaluate, move actors),
//! `reporter.rs` (failure reports and notifiers), `workflow.rs` (controller),
//! `supervisor.rs` (any-state events), `error.rs`.

pub mod context;
pub mod error;
pub mod reporter;
pub mod stages;
pub mod state;
pub mod supervisor;
pub mod workflow;

pub use context::RunContext;
pub use error::{FileIssue, MoveError, StageFailure, WorkflowError, WorkflowResult};
pub use reporter::{
    ErrorReporter, EventBusNotifier, FailureReport, FanoutNotifier, Notifier, NotifyError,
    TracingNotifier, WebhookNotifier,
};
pub use stages::{StageOutput, StageResult};
pub use state::{MergePolicy, Outcome, PipelineState, Stage, Transition, Trigger};
pub use supervisor::{Supervisor, SupervisorEvent};
pub use workflow::{ScannerWorkflow, WorkflowDeps, WorkflowSettings};
