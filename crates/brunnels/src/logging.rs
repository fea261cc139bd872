//! Logging setup for the command-line application
//!
//! Log lines go to stderr so that stdout only carries the report.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Default filter when `RUST_LOG` is not set
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,brunnels=debug,brunnel_lib=debug"
    } else if cfg!(debug_assertions) {
        "info,brunnel_lib=debug"
    } else {
        "info"
    }
}

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence unless `verbose` is set, which forces per-candidate debug
/// logs for this workspace's crates.
pub fn setup_logging(verbose: bool) {
    let from_env = std::env::var("RUST_LOG").ok().filter(|_| !verbose);
    let filter = match &from_env {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::new(default_filter(verbose)),
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).init();

    match from_env {
        Some(directives) => tracing::debug!("Logging initialized from RUST_LOG: {}", directives),
        None => tracing::debug!("Logging initialized with default filter: {}", default_filter(verbose)),
    }
}
