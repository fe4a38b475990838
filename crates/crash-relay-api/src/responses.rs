//! Response types for the API.

use chrono::{DateTime, Utc};
use crash_relay_core::{DispatchOutcome, RelayOutcome};
use serde::Serialize;

// ============================================================================
// Response Types
// ============================================================================

/// Successful webhook response, tagged by `status`
///
/// ```json
/// {"status": "dispatched", "title": "...", "culprit": "...", "level": "error"}
/// {"status": "ignored", "action": "resolved"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WebhookResponse {
    Dispatched {
        title: String,
        culprit: String,
        level: String,
    },
    Ignored {
        action: serde_json::Value,
    },
}

impl From<RelayOutcome> for WebhookResponse {
    fn from(outcome: RelayOutcome) -> Self {
        match outcome {
            RelayOutcome::Ignored { action } => Self::Ignored { action },
            RelayOutcome::Dispatched(DispatchOutcome {
                title,
                culprit,
                level,
                ..
            }) => Self::Dispatched {
                title,
                culprit,
                level,
            },
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        }
    }
}
