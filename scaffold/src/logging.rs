//! Tracing setup for the scaffolder.
//!
//! Diagnostics go to stderr so stdout stays free for command output
//! (action lists, prompts, reports). Run logs under `.scaffold/runs/` are
//! written regardless of the filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "scaffold=info,warn";

/// Initialize the global subscriber.
///
/// Reads `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
///
/// # Example
/// ```bash
/// RUST_LOG=scaffold=debug scaffold capture tests/login.md
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
