//! # Dispatch Forwarding
//!
//! Sends one crash notification to the GitHub automation API and classifies
//! the outcome. There is exactly one attempt per notification; retries are
//! left to the provider redelivering the webhook.
//!
//! | Result | Classification |
//! |---|---|
//! | 2xx | [`DispatchOutcome`] |
//! | missing credentials | [`DispatchError::Configuration`], no request sent |
//! | non-2xx | [`DispatchError::Upstream`] with status and body |
//! | connect / DNS / timeout | [`DispatchError::Transport`] |

use crate::{config::IntegrationConfig, payload::CrashMetadata, ErrorCategory};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, instrument};

mod strategy;

pub use strategy::{DispatchStrategy, RepositoryEventDispatch, WorkflowDispatch};

/// GitHub REST API version sent with every request
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Media type GitHub recommends for REST requests
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

const USER_AGENT: &str = concat!("crash-relay/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Types
// ============================================================================

/// Fully built outbound request
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub url: url::Url,
    pub body: serde_json::Value,
}

/// Successful dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub title: String,
    pub culprit: String,
    pub level: String,

    /// Status GitHub answered with (normally 204)
    #[serde(skip)]
    pub upstream_status: u16,
}

/// Dispatch failures
///
/// None of the variants carry the access token.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Required GitHub settings are unset; no request was attempted
    #[error("GitHub integration not configured, missing: {}", .missing.join(", "))]
    Configuration { missing: Vec<&'static str> },

    /// The dispatch URL could not be built from the configured values
    #[error("Invalid dispatch endpoint: {message}")]
    InvalidEndpoint { message: String },

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client: {message}")]
    HttpClient { message: String },

    /// GitHub answered with a non-success status
    #[error("GitHub API returned {status}")]
    Upstream { status: u16, body: String },

    /// The request never produced a response
    #[error("Network error: {message}")]
    Transport { message: String },
}

impl DispatchError {
    /// Get error category for monitoring
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::InvalidEndpoint { .. } => ErrorCategory::Configuration,
            Self::HttpClient { .. } => ErrorCategory::Configuration,
            Self::Upstream { status, .. } if *status >= 500 || *status == 429 => {
                ErrorCategory::Transient
            }
            Self::Upstream { .. } => ErrorCategory::Permanent,
            Self::Transport { .. } => ErrorCategory::Transient,
        }
    }
}

// ============================================================================
// Forwarder
// ============================================================================

/// Sends crash metadata to GitHub using a [`DispatchStrategy`]
#[derive(Clone)]
pub struct DispatchForwarder {
    http_client: reqwest::Client,
    strategy: Arc<dyn DispatchStrategy>,
    timeout: Duration,
}

impl DispatchForwarder {
    /// Create a forwarder with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::HttpClient`] if the HTTP client cannot be created.
    pub fn new(
        strategy: Arc<dyn DispatchStrategy>,
        timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DispatchError::HttpClient {
                message: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            strategy,
            timeout,
        })
    }

    /// Create a forwarder from the integration settings
    pub fn from_config(config: &IntegrationConfig) -> Result<Self, DispatchError> {
        Self::new(config.dispatch.to_strategy(), config.request_timeout())
    }

    /// Name of the active strategy
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Build the outbound request without sending it.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Configuration`] when token, owner, repository or a
    ///   strategy-specific setting is empty
    /// - [`DispatchError::InvalidEndpoint`] when the base URL cannot carry a path
    pub fn build_request(
        &self,
        config: &IntegrationConfig,
        metadata: &CrashMetadata,
    ) -> Result<DispatchRequest, DispatchError> {
        let mut missing = config.missing_github_settings();
        missing.extend(self.strategy.missing_settings());
        if !missing.is_empty() {
            return Err(DispatchError::Configuration { missing });
        }

        let mut url = url::Url::parse(&config.api_base_url).map_err(|e| {
            DispatchError::InvalidEndpoint {
                message: format!("'{}': {}", config.api_base_url, e),
            }
        })?;
        url.path_segments_mut()
            .map_err(|_| DispatchError::InvalidEndpoint {
                message: format!("'{}' cannot be a base URL", config.api_base_url),
            })?
            .pop_if_empty()
            .extend(
                self.strategy
                    .path_segments(config.github_owner.trim(), config.github_repo.trim()),
            );

        Ok(DispatchRequest {
            url,
            body: self.strategy.request_body(metadata),
        })
    }

    /// Forward crash metadata to GitHub. Makes at most one HTTP request.
    #[instrument(skip(self, config, metadata), fields(strategy = self.strategy.name()))]
    pub async fn forward(
        &self,
        config: &IntegrationConfig,
        metadata: &CrashMetadata,
    ) -> Result<DispatchOutcome, DispatchError> {
        let request = self.build_request(config, metadata)?;

        let response = self
            .http_client
            .post(request.url)
            .bearer_auth(config.github_token.expose_secret())
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| {
                let message = describe_transport_error(&e, self.timeout);
                error!(error = %message, "Network error calling GitHub API");
                DispatchError::Transport { message }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            error!(status = status.as_u16(), body = %body, "GitHub API error");
            return Err(DispatchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            title = %metadata.title,
            culprit = %metadata.culprit,
            "Dispatched crash notification to GitHub"
        );

        Ok(DispatchOutcome {
            title: metadata.title.clone(),
            culprit: metadata.culprit.clone(),
            level: metadata.level.clone(),
            upstream_status: status.as_u16(),
        })
    }
}

impl std::fmt::Debug for DispatchForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchForwarder")
            .field("strategy", &self.strategy.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Short description of a request that produced no response.
fn describe_transport_error(error: &reqwest::Error, timeout: Duration) -> String {
    if error.is_timeout() {
        format!("request timed out after {:?}", timeout)
    } else if error.is_connect() {
        "could not connect to GitHub API".to_string()
    } else {
        // Strip the URL so the message stays short.
        let mut message = error.to_string();
        if let Some(url) = error.url() {
            message = message.replace(&format!(" ({})", url), "");
        }
        message
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
