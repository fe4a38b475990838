//! # Integration Configuration
//!
//! Process-wide settings for the inbound signature check and the outbound
//! GitHub dispatch call. Built once at start-up and shared read-only.

use crate::dispatch::{DispatchStrategy, RepositoryEventDispatch, WorkflowDispatch};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc, time::Duration};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Default GitHub REST API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Default outbound request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;

/// Default workflow file triggered by the workflow dispatch strategy
pub const DEFAULT_WORKFLOW_FILE: &str = "sentry-crash-triage.lock.yml";

/// Default git ref the workflow is dispatched on
pub const DEFAULT_GIT_REF: &str = "main";

/// Default `event_type` for repository dispatch events
pub const DEFAULT_EVENT_TYPE: &str = "sentry-crash";

// ============================================================================
// Secret Values
// ============================================================================

/// Secure container for secret configuration values
///
/// Secret values are never included in Debug output or logs and the backing
/// buffer is wiped on drop.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretValue {
    inner: String,
}

impl SecretValue {
    /// Create secret value from string
    pub fn from_string(value: String) -> Self {
        Self { inner: value }
    }

    /// Get secret as string (only for immediate use)
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    /// Get secret as bytes
    pub fn expose_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Check if secret is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get secret length without exposing content
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self::from_string(value.to_string())
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("length", &self.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}

// Secrets serialize as a redaction marker so a dumped configuration never
// carries credentials.
impl Serialize for SecretValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_empty() {
            serializer.serialize_str("")
        } else {
            serializer.serialize_str("[REDACTED]")
        }
    }
}

// ============================================================================
// Dispatch Target
// ============================================================================

/// Which GitHub automation endpoint a crash notification is forwarded to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DispatchTarget {
    /// `POST /repos/{owner}/{repo}/actions/workflows/{file}/dispatches`
    Workflow {
        #[serde(default = "default_workflow_file")]
        workflow_file: String,

        #[serde(default = "default_git_ref")]
        git_ref: String,
    },

    /// `POST /repos/{owner}/{repo}/dispatches`
    RepositoryEvent {
        #[serde(default = "default_event_type")]
        event_type: String,
    },
}

impl DispatchTarget {
    /// Build the strategy implementation for this target
    pub fn to_strategy(&self) -> Arc<dyn DispatchStrategy> {
        match self {
            Self::Workflow {
                workflow_file,
                git_ref,
            } => Arc::new(WorkflowDispatch::new(workflow_file.clone(), git_ref.clone())),
            Self::RepositoryEvent { event_type } => {
                Arc::new(RepositoryEventDispatch::new(event_type.clone()))
            }
        }
    }
}

impl Default for DispatchTarget {
    fn default() -> Self {
        Self::Workflow {
            workflow_file: default_workflow_file(),
            git_ref: default_git_ref(),
        }
    }
}

fn default_workflow_file() -> String {
    DEFAULT_WORKFLOW_FILE.to_string()
}

fn default_git_ref() -> String {
    DEFAULT_GIT_REF.to_string()
}

fn default_event_type() -> String {
    DEFAULT_EVENT_TYPE.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_seconds() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECONDS
}

// ============================================================================
// Integration Configuration
// ============================================================================

/// Sentry and GitHub integration settings
///
/// Every field is optional in configuration sources. Missing GitHub
/// credentials are not rejected here: the forwarder reports them per request
/// so the service can still start and answer signature or payload errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Shared secret Sentry signs webhook bodies with (empty = unverified)
    pub sentry_client_secret: SecretValue,

    /// GitHub personal access token used as bearer token
    pub github_token: SecretValue,

    /// Repository owner (user or organisation)
    pub github_owner: String,

    /// Repository name
    pub github_repo: String,

    /// GitHub REST API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Outbound request timeout in seconds
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Outbound endpoint selection
    pub dispatch: DispatchTarget,
}

impl IntegrationConfig {
    /// Outbound request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Whether inbound signatures are checked at all
    pub fn verification_enabled(&self) -> bool {
        !self.sentry_client_secret.is_empty()
    }

    /// Names of the GitHub settings that are still unset
    pub fn missing_github_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.github_token.is_empty() {
            missing.push("GH_PAT");
        }
        if self.github_owner.trim().is_empty() {
            missing.push("GH_OWNER");
        }
        if self.github_repo.trim().is_empty() {
            missing.push("GH_REPO");
        }
        missing
    }

    /// Validate the settings that can be checked without a request
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationConfigError`] when the API base URL cannot be
    /// parsed or the timeout is zero.
    pub fn validate(&self) -> Result<(), IntegrationConfigError> {
        let parsed = url::Url::parse(&self.api_base_url).map_err(|e| {
            IntegrationConfigError::InvalidApiBaseUrl {
                url: self.api_base_url.clone(),
                message: e.to_string(),
            }
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(IntegrationConfigError::InvalidApiBaseUrl {
                url: self.api_base_url.clone(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        if self.request_timeout_seconds == 0 {
            return Err(IntegrationConfigError::InvalidTimeout);
        }

        Ok(())
    }
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            sentry_client_secret: SecretValue::default(),
            github_token: SecretValue::default(),
            github_owner: String::new(),
            github_repo: String::new(),
            api_base_url: default_api_base_url(),
            request_timeout_seconds: default_request_timeout_seconds(),
            dispatch: DispatchTarget::default(),
        }
    }
}

/// Static validation failures of [`IntegrationConfig`]
#[derive(Debug, thiserror::Error)]
pub enum IntegrationConfigError {
    #[error("Invalid GitHub API base URL '{url}': {message}")]
    InvalidApiBaseUrl { url: String, message: String },

    #[error("Outbound request timeout must be greater than zero")]
    InvalidTimeout,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
