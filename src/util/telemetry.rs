//! Telemetry helpers for structured logging.
//!
//! The pool and queues only emit events; installing a subscriber is left to
//! the embedding application. These helpers cover binaries and tests that
//! just want log output.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "prometheus_jobs=info";

/// Install an env-filtered fmt subscriber unless one is already set.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_DIRECTIVE);
}

/// Like [`init_tracing`], falling back to `directive` when `RUST_LOG` is unset.
pub fn init_tracing_with(directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
