//! Tracing subscriber setup for applications embedding the engine.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Install a global tracing subscriber with the given level and format.
///
/// `RUST_LOG` takes precedence over `level` when set. Pass
/// `format = "json"` for structured JSON output; any other value selects
/// human-readable text.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is left in place.
pub fn init_logging(level: &str, format: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init()
            .is_ok()
    }
}
