//! Tracing initialization for the CLI.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize tracing on stderr.
///
/// Stdout is reserved for protocol messages, so all log output goes to stderr.
/// Uses the `RUST_LOG` environment variable for filtering when it is set,
/// otherwise `default_level` (e.g. `"info"`).
pub fn init_tracing(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}
