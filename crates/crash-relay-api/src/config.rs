//! Configuration types for the HTTP service

use crash_relay_core::{
    action::DEFAULT_ACCEPTED_ACTIONS, ActionFilter, IntegrationConfig, IntegrationConfigError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming an explicit configuration file
pub const CONFIG_FILE_ENV: &str = "CRASH_RELAY_CONFIG_FILE";

/// Prefix of nested environment overrides, e.g. `CRASH_RELAY__SERVER__PORT`
pub const ENV_PREFIX: &str = "CRASH_RELAY";

/// Flat environment variables mapped onto configuration keys.
///
/// These are applied last and win over every other source.
pub const FLAT_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SENTRY_CLIENT_SECRET", "integration.sentry_client_secret"),
    ("GH_PAT", "integration.github_token"),
    ("GH_OWNER", "integration.github_owner"),
    ("GH_REPO", "integration.github_repo"),
    ("GH_API_URL", "integration.api_base_url"),
    ("GH_DISPATCH_MODE", "integration.dispatch.mode"),
    ("GH_WORKFLOW_FILE", "integration.dispatch.workflow_file"),
    ("GH_REF", "integration.dispatch.git_ref"),
    ("GH_EVENT_TYPE", "integration.dispatch.event_type"),
];

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook endpoint settings
    pub webhook: WebhookConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Sentry and GitHub integration settings
    pub integration: IntegrationConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_size: 1024 * 1024, // 1MiB
        }
    }
}

/// Webhook endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Path Sentry posts to. The same path with a trailing slash is also served.
    pub path: String,

    /// Actions that trigger a dispatch
    pub accepted_actions: Vec<String>,

    /// Refuse to start without a Sentry client secret
    pub require_signature: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            path: "/webhooks/sentry".to_string(),
            accepted_actions: DEFAULT_ACCEPTED_ACTIONS
                .iter()
                .map(|a| a.to_string())
                .collect(),
            require_signature: false,
        }
    }
}

impl WebhookConfig {
    /// Build the action filter for this endpoint
    pub fn action_filter(&self) -> ActionFilter {
        ActionFilter::new(self.accepted_actions.iter().cloned())
    }

    /// The configured path without any trailing slash
    pub fn canonical_path(&self) -> &str {
        self.path.trim_end_matches('/')
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive when `RUST_LOG` is not set
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from files and the environment.
    ///
    /// Sources, later ones overriding earlier ones:
    ///
    /// 1. `/etc/crash-relay/service.yaml`
    /// 2. `./config/service.yaml`
    /// 3. `explicit_path`, or the file named by `CRASH_RELAY_CONFIG_FILE`
    /// 4. `CRASH_RELAY__SECTION__KEY` environment variables
    /// 5. the flat variables in [`FLAT_ENV_OVERRIDES`] (`GH_PAT`, `GH_OWNER`, ...)
    ///
    /// Every field has a default, so no source is mandatory except an
    /// explicitly named file.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("integration.dispatch.mode", "workflow")?
            .add_source(
                config::File::with_name("/etc/crash-relay/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name("config/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        let explicit = explicit_path.map(Path::to_path_buf).or_else(|| {
            std::env::var(CONFIG_FILE_ENV)
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        });
        if let Some(path) = explicit {
            info!(path = %path.display(), "Loading configuration from explicit path");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        for (variable, key) in FLAT_ENV_OVERRIDES {
            if let Ok(value) = std::env::var(variable) {
                if !value.is_empty() {
                    builder = builder.set_override(*key, value)?;
                }
            }
        }

        let service_config: ServiceConfig = builder.build()?.try_deserialize()?;
        Ok(service_config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be greater than 0".to_string(),
            });
        }

        if self.server.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than 0".to_string(),
            });
        }

        if !self.webhook.path.starts_with('/') || self.webhook.canonical_path().is_empty() {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhook.path '{}' must start with '/' and name a path below the root",
                    self.webhook.path
                ),
            });
        }

        if self.webhook.path.contains(['{', '}', '*'])
            || self
                .webhook
                .path
                .split('/')
                .any(|segment| segment.starts_with(':'))
        {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhook.path '{}' must not contain route parameters",
                    self.webhook.path
                ),
            });
        }

        if self.webhook.path == "/health" || self.webhook.canonical_path() == "/health" {
            return Err(ConfigError::Invalid {
                message: "webhook.path must not collide with /health".to_string(),
            });
        }

        if self
            .webhook
            .accepted_actions
            .iter()
            .all(|action| action.trim().is_empty())
        {
            return Err(ConfigError::Missing {
                key: "webhook.accepted_actions".to_string(),
            });
        }

        if self.webhook.require_signature && !self.integration.verification_enabled() {
            return Err(ConfigError::Missing {
                key: "integration.sentry_client_secret (SENTRY_CLIENT_SECRET)".to_string(),
            });
        }

        self.integration.validate()?;

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Invalid integration configuration: {0}")]
    Integration(#[from] IntegrationConfigError),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
