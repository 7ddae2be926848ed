//! Diagnostics via `RUST_LOG`, written to stderr.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; falls back to `default_filter` when it is unset. The
/// interactive UI passes `"off"` so log lines never land on the alternate screen.
///
/// # Example
/// ```bash
/// RUST_LOG=grid_walker_core=debug grid_walker_tui --headless --level levels/level01.txt
/// ```
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
