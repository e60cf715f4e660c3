//! Tracing subscriber setup for the binary.
//!
//! Filter priority: `GEOLEARN_LOG`, then `RUST_LOG`, then `--verbose`
//! (debug for this crate) or the default (warn).

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Call once, early in `main`.
pub fn init(verbose: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact();

    tracing_subscriber::registry()
        .with(build_filter(verbose))
        .with(fmt_layer)
        .init();
}

fn build_filter(verbose: bool) -> EnvFilter {
    if let Ok(directives) = std::env::var("GEOLEARN_LOG") {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if verbose {
        EnvFilter::new("warn,geolearn=debug")
    } else {
        EnvFilter::new("warn")
    }
}
