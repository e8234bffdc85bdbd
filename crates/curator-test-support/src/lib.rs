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
#![allow(clippy::module_name_repetitions)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (temporary library trees), mocks.rs (probe, filesystem, and ledger doubles).

pub mod fixtures;
pub mod mocks;

pub use fixtures::LibraryFixture;
pub use mocks::{RecordingLedger, RestrictedFs, StaticProbe};
