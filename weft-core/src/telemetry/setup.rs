//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the Weft tracing/logging system.
///
/// Reads the `WEFT_LOG` environment variable for per-subsystem log
/// levels, e.g. `WEFT_LOG=weft_engine=debug,weft_cache=warn`.
///
/// Falls back to `weft=info` if `WEFT_LOG` is not set or is invalid.
///
/// Idempotent: calling it multiple times is safe, and it yields if
/// another subscriber was installed first.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("WEFT_LOG")
            .unwrap_or_else(|_| EnvFilter::new("weft=info"));

        // try_init: an embedding application may have installed its own
        // subscriber already.
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .try_init();
    });
}
