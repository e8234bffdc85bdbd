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

//! Filesystem access for library curation.
//!
//! Layout: `fs.rs` (`LibraryFs` seam and `LocalFs`), `ledger.rs` (processed
//! directory ledger), `relocate.rs` (destination paths), `rules.rs` (exclude
//! globs), `error.rs`.

pub mod error;
pub mod fs;
pub mod ledger;
pub mod relocate;
pub mod rules;

pub use error::{FsOpsError, FsOpsResult};
pub use fs::{AccessStatus, LibraryFs, LocalFs};
pub use ledger::{JsonLedger, NoopLedger, ProcessedLedger};
pub use relocate::destination_for;
pub use rules::ExcludeRules;
