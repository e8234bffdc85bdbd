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

//! File-backed configuration for the curator.
//!
//! Layout: `model.rs` (typed sections), `defaults.rs` (documented defaults),
//! `loader.rs` (YAML parsing and override layering), `validate.rs`, `error.rs`.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    apply_env_overrides, apply_overrides, from_yaml_str, load, load_from_path, render_yaml,
};
pub use model::{
    ConcurrencyConfig, ConfigOverrides, CuratorConfig, EvaluationConfig, LibraryConfig,
    NotifierConfig, ScanConfig, TelemetryConfig,
};
pub use validate::validate;
