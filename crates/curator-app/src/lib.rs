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

//! Curator application wiring.
//!
//! Layout: `cli.rs` (argument parsing and commands), `bootstrap.rs` (service
//! wiring), `error.rs`.

/// Service wiring and single-run driver.
pub mod bootstrap;
/// Command-line parsing and dispatch.
pub mod cli;
/// Application error type.
pub mod error;

pub use bootstrap::{RunSummary, build_workflow, load_config, run_once};
pub use cli::run;
pub use error::{AppError, AppResult};
