//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive string.
pub const LOG_ENV_VAR: &str = "SERPSYNTH_LOG";

static INIT: Once = Once::new();

/// Initialize the tracing/logging system.
///
/// Reads `SERPSYNTH_LOG` for per-module log levels, e.g.
/// `SERPSYNTH_LOG=serpsynth_pipeline=debug,serpsynth_storage=warn`.
/// Falls back to `default_level` for every serpsynth crate if unset or invalid.
///
/// Idempotent: only the first call installs a subscriber.
pub fn init_tracing(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();
    });
}

/// Directive string applying `level` to every serpsynth crate.
pub fn default_directives(level: &str) -> String {
    ["serpsynth", "serpsynth_core", "serpsynth_storage", "serpsynth_pipeline"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
