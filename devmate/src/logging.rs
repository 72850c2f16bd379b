//! Diagnostic tracing for the devmate CLI.
//!
//! Diagnostics go to stderr so that stdout carries only command output
//! (run results, plans, printed messages).

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=devmate=debug devmate run "show git status"
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
