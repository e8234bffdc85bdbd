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

//! Media inspection used to classify library files by resolution.

pub mod error;
pub mod probe;

pub use error::{ProbeError, ProbeResult};
pub use probe::{FfprobeProbe, FrameDimensions, MediaProbe, ResolutionThreshold, parse_dimensions};
