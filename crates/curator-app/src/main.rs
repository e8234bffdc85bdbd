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

//! Binary entrypoint for the curator pipeline.

use std::process;

/// Runs the requested command and exits with its status.
#[tokio::main]
async fn main() {
    let code = curator_app::run().await;
    if code != 0 {
        process::exit(code);
    }
}
