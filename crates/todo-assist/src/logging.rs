//! `tracing` subscriber setup shared by the binaries.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Build the log filter: `RUST_LOG` when set and valid, otherwise
/// `default_directive` (e.g. `"info"` or `"todo_assist=debug"`).
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install a stderr formatter filtered by [`env_filter`]. Calling it twice
/// is a no-op.
pub fn init_tracing(default_directive: &str) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing("warn");
        init_tracing("debug");
        tracing::warn!("still logging");
    }
}
