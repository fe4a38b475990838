//! Tracing subscriber setup

use crash_relay_api::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FALLBACK_LEVEL: &str = "info";

/// Filter directives used when `RUST_LOG` is not set.
///
/// The service crates and the HTTP trace layer log at `level`; everything
/// else only at `warn`.
pub fn default_directives(level: &str) -> String {
    format!(
        "warn,crash_relay_service={level},crash_relay_api={level},crash_relay_core={level},tower_http={level}",
        level = level.trim()
    )
}

/// Build the filter from `RUST_LOG`, else from the configured level.
///
/// An unparseable level falls back to `info`.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(default_directives(&config.level))
            .unwrap_or_else(|_| EnvFilter::new(default_directives(FALLBACK_LEVEL)))
    })
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(build_filter(config));

    if config.json_format {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
