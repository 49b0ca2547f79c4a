//! Structured logging setup.
//!
//! - [`init_logging`]: one-time `tracing` subscriber with `RUST_LOG` support
//! - [`build_filter`]: the filter it installs, exposed for tests and hosts
//!   that build their own subscriber

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_FILTER: &str = "rowgraph=info";

/// Resolve the log filter: `RUST_LOG` wins, then `fallback`, then
/// [`DEFAULT_FILTER`] if `fallback` does not parse.
pub fn build_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize structured logging to stderr.
///
/// Call once at program startup; later calls are ignored, so tests may
/// call it freely.
pub fn init_logging(fallback: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(fallback))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_does_not_panic() {
        init_logging(DEFAULT_FILTER);
        // Second call is a no-op.
        init_logging("debug");
    }

    #[test]
    fn fallback_used_without_rust_log() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(build_filter("rowgraph=debug").to_string(), "rowgraph=debug");
        }
    }
}
