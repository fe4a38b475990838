//! # Crash Relay Core
//!
//! Core business logic for relaying Sentry crash notifications to GitHub
//! automation.
//!
//! This crate contains the domain logic for verifying webhook signatures,
//! extracting crash metadata, filtering notification actions, and forwarding
//! the result to the GitHub dispatch API.
//!
//! ## Architecture
//!
//! - [`signature`]: HMAC-SHA256 verification of the raw body
//! - [`payload`]: flattening of issue/event alert shapes into [`CrashMetadata`]
//! - [`action`]: accept-list of lifecycle actions
//! - [`dispatch`]: outbound request building, sending and classification
//! - [`relay`]: the pipeline tying the above together
//!
//! Configuration is passed in explicitly; nothing here reads the environment.
//!
//! ## Usage
//!
//! ```rust
//! use crash_relay_core::CrashMetadata;
//! use serde_json::json;
//!
//! let payload = json!({ "data": { "event": { "title": "KeyError" } } });
//! let metadata = CrashMetadata::extract(payload.as_object().unwrap());
//! assert_eq!(metadata.title, "KeyError");
//! assert_eq!(metadata.culprit, "unknown");
//! ```

pub mod action;
pub mod config;
pub mod dispatch;
pub mod payload;
pub mod relay;
pub mod signature;

pub use action::{ActionDecision, ActionFilter};
pub use config::{DispatchTarget, IntegrationConfig, IntegrationConfigError, SecretValue};
pub use dispatch::{
    DispatchError, DispatchForwarder, DispatchOutcome, DispatchRequest, DispatchStrategy,
    RepositoryEventDispatch, WorkflowDispatch,
};
pub use payload::CrashMetadata;
pub use relay::{CrashRelay, InboundNotification, NotificationProcessor, RelayError, RelayOutcome};
pub use signature::{verify_signature, RejectionReason, VerificationResult};

/// Error classification for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Temporary failures that may succeed when the provider redelivers
    Transient,
    /// Permanent failures that won't succeed on retry
    Permanent,
    /// Security-related failures requiring immediate attention
    Security,
    /// Missing or invalid integration settings
    Configuration,
}
