//! # Notification Relay Pipeline
//!
//! Runs one inbound Sentry notification through the full pipeline:
//!
//! ```text
//! verify signature -> parse JSON -> extract metadata -> filter action -> dispatch
//! ```
//!
//! The pipeline is transport-agnostic. The HTTP layer turns the returned
//! [`RelayOutcome`] or [`RelayError`] into a response.

use crate::{
    action::{ActionDecision, ActionFilter},
    config::IntegrationConfig,
    dispatch::{DispatchError, DispatchForwarder, DispatchOutcome},
    payload::CrashMetadata,
    signature::{verify_signature, RejectionReason, VerificationResult, SIGNATURE_HEADER},
    ErrorCategory,
};
use async_trait::async_trait;
use bytes::Bytes;
use std::{collections::HashMap, sync::Arc};
use tracing::{error, info, instrument, warn};

/// Header naming the Sentry resource a notification is about (`issue`, `event_alert`, ...)
pub const RESOURCE_HEADER: &str = "sentry-hook-resource";

// ============================================================================
// Core Types
// ============================================================================

/// Raw inbound request as received from Sentry
///
/// The body is kept as the exact bytes received: it is hashed for the
/// signature check and parsed as JSON from the same buffer.
#[derive(Debug, Clone)]
pub struct InboundNotification {
    pub signature: Option<String>,
    pub resource: Option<String>,
    pub body: Bytes,
}

impl InboundNotification {
    /// Create a notification from a lower-cased header map and the raw body
    pub fn from_http_headers(headers: &HashMap<String, String>, body: Bytes) -> Self {
        Self {
            signature: headers.get(SIGNATURE_HEADER).cloned(),
            resource: headers.get(RESOURCE_HEADER).cloned(),
            body,
        }
    }

    /// Get signature from headers if present
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}

/// Successful pipeline results
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// The action is not one that triggers automation
    Ignored { action: serde_json::Value },

    /// The notification was forwarded
    Dispatched(DispatchOutcome),
}

/// Pipeline failures
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid signature: {reason}")]
    InvalidSignature { reason: RejectionReason },

    #[error("Invalid JSON payload: {message}")]
    MalformedPayload { message: String },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl RelayError {
    /// Get error category for monitoring
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSignature { .. } => ErrorCategory::Security,
            Self::MalformedPayload { .. } => ErrorCategory::Permanent,
            Self::Dispatch(e) => e.error_category(),
        }
    }
}

// ============================================================================
// Trait Definitions
// ============================================================================

/// Interface for processing inbound notifications
#[async_trait]
pub trait NotificationProcessor: Send + Sync {
    /// Run one notification through the pipeline
    async fn process_notification(
        &self,
        notification: InboundNotification,
    ) -> Result<RelayOutcome, RelayError>;
}

// ============================================================================
// Default Implementation
// ============================================================================

/// Relays Sentry crash notifications to GitHub
///
/// Holds only read-only state, so one instance serves every request
/// concurrently.
#[derive(Debug, Clone)]
pub struct CrashRelay {
    config: Arc<IntegrationConfig>,
    filter: ActionFilter,
    forwarder: DispatchForwarder,
}

impl CrashRelay {
    pub fn new(
        config: Arc<IntegrationConfig>,
        filter: ActionFilter,
        forwarder: DispatchForwarder,
    ) -> Self {
        Self {
            config,
            filter,
            forwarder,
        }
    }

    /// Build a relay whose forwarder follows the configured dispatch target
    pub fn from_config(
        config: Arc<IntegrationConfig>,
        filter: ActionFilter,
    ) -> Result<Self, DispatchError> {
        let forwarder = DispatchForwarder::from_config(&config)?;
        Ok(Self::new(config, filter, forwarder))
    }

    /// Name of the dispatch strategy notifications are forwarded with
    pub fn dispatch_strategy(&self) -> &'static str {
        self.forwarder.strategy_name()
    }

    /// Parse the body into a JSON object
    fn parse_payload(
        body: &[u8],
    ) -> Result<serde_json::Map<String, serde_json::Value>, RelayError> {
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(object)) => Ok(object),
            Ok(_) => Err(RelayError::MalformedPayload {
                message: "payload is not a JSON object".to_string(),
            }),
            Err(e) => Err(RelayError::MalformedPayload {
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl NotificationProcessor for CrashRelay {
    #[instrument(skip(self, notification), fields(
        resource = notification.resource.as_deref().unwrap_or("unknown"),
        body_size = notification.body.len(),
    ))]
    async fn process_notification(
        &self,
        notification: InboundNotification,
    ) -> Result<RelayOutcome, RelayError> {
        let verification = verify_signature(
            self.config.sentry_client_secret.expose_bytes(),
            notification.signature(),
            &notification.body,
        );
        if let VerificationResult::Rejected(reason) = verification {
            let e = RelayError::InvalidSignature { reason };
            warn!(
                reason = %reason,
                category = ?e.error_category(),
                "Sentry webhook signature verification failed"
            );
            return Err(e);
        }

        let payload = Self::parse_payload(&notification.body).map_err(|e| {
            warn!(
                error = %e,
                category = ?e.error_category(),
                "Sentry webhook received invalid JSON"
            );
            e
        })?;

        let metadata = CrashMetadata::extract(&payload);

        let action = match self.filter.evaluate(&payload) {
            ActionDecision::Process { action } => action,
            ActionDecision::Ignore { action } => {
                info!(action = %action, "Ignoring Sentry webhook action");
                return Ok(RelayOutcome::Ignored { action });
            }
        };

        info!(
            action = %action,
            level = %metadata.level,
            title = %metadata.title,
            culprit = %metadata.culprit,
            "Received Sentry webhook"
        );

        let outcome = self
            .forwarder
            .forward(&self.config, &metadata)
            .await
            .map_err(|e| {
                let category = e.error_category();
                match &e {
                    DispatchError::Configuration { missing } => error!(
                        missing = ?missing,
                        category = ?category,
                        "GitHub settings not fully configured; set GH_PAT, GH_OWNER and GH_REPO"
                    ),
                    _ => warn!(
                        error = %e,
                        category = ?category,
                        "Crash notification was not dispatched"
                    ),
                }
                RelayError::Dispatch(e)
            })?;

        Ok(RelayOutcome::Dispatched(outcome))
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
