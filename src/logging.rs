//! Console logging setup
//!
//! A `tracing` fmt subscriber on stderr, filtered by `RUST_LOG` and defaulting
//! to `ledger=info`. Stdout stays free for command output.

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Default directive when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "ledger=info";

/// Install the global subscriber; later calls do nothing
///
/// `quiet` lowers the default to warnings only. An explicit `RUST_LOG`
/// always wins.
pub fn init(quiet: bool) {
    TRACING_INIT.call_once(|| {
        let fallback = if quiet { "ledger=warn" } else { DEFAULT_DIRECTIVE };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

        // Another subscriber may already be installed by an embedding program.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
