//! Tracing setup for the host tool
//!
//! The library only emits `tracing` events: frame-level detail at `trace`,
//! protocol progress at `debug`, dropped frames at `warn`. Nothing is ever
//! written to the protocol stream itself.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Initialize tracing for debug output
///
/// Call early in main() before any logging occurs.
/// Set `verbose` to true for debug-level output; `RUST_LOG` takes precedence.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(filter)
        .try_init();
}
