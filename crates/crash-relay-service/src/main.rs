//! # Crash Relay Service
//!
//! Binary entry point for the Sentry to GitHub crash relay.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Builds the relay pipeline
//! - Starts the HTTP server from crash-relay-api

mod logging;

use crash_relay_api::{start_server, ServiceConfig};
use crash_relay_core::CrashRelay;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Logging settings live in the configuration, so the subscriber is
    // installed after loading. A load failure still gets logged with the
    // built-in defaults.
    // -------------------------------------------------------------------------
    let loaded = ServiceConfig::load(None);
    let logging_config = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    logging::init(&logging_config);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Crash Relay Service");

    let service_config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(
                error = %e,
                "Could not load service configuration; aborting. \
                 Fix the configuration and restart."
            );
            std::process::exit(3);
        }
    };

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    for warning in startup_warnings(&service_config) {
        warn!("{}", warning);
    }

    // -------------------------------------------------------------------------
    // Build the relay pipeline
    // -------------------------------------------------------------------------
    let relay = match CrashRelay::from_config(
        Arc::new(service_config.integration.clone()),
        service_config.webhook.action_filter(),
    ) {
        Ok(relay) => relay,
        Err(e) => {
            error!(error = %e, "Failed to build relay pipeline; aborting");
            std::process::exit(3);
        }
    };

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        path = %service_config.webhook.path,
        dispatch = relay.dispatch_strategy(),
        signature_verification = service_config.integration.verification_enabled(),
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, Arc::new(relay)).await {
        error!("Failed to start server: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Operator-facing warnings about a configuration that starts but is degraded
fn startup_warnings(config: &ServiceConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.integration.verification_enabled() {
        warnings.push(
            "SENTRY_CLIENT_SECRET is not set; webhook signatures will NOT be verified. \
             Do not use in production."
                .to_string(),
        );
    }

    let missing = config.integration.missing_github_settings();
    if !missing.is_empty() {
        warnings.push(format!(
            "GitHub integration not configured (missing {}); accepted webhooks will be \
             answered with 500 until GH_PAT, GH_OWNER and GH_REPO are set",
            missing.join(", ")
        ));
    }

    warnings
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
