//! Action filtering for inbound notifications.
//!
//! Sentry sends a notification for every lifecycle change of an issue
//! (created, resolved, assigned, ...). Only creation-like actions trigger a
//! dispatch; everything else is acknowledged and ignored so that resolving or
//! reopening an issue does not start the automation again.
//!
//! The filter looks at one notification at a time. A provider retry of the
//! same notification passes the filter again.

use serde_json::{Map, Value};

/// Action assumed when a notification does not carry one
pub const DEFAULT_ACTION: &str = "created";

/// Actions accepted by default
pub const DEFAULT_ACCEPTED_ACTIONS: [&str; 2] = ["created", "triggered"];

/// Decision for a single notification
#[derive(Debug, Clone, PartialEq)]
pub enum ActionDecision {
    /// Forward the notification
    Process { action: String },

    /// Acknowledge without forwarding; carries the received value verbatim
    Ignore { action: Value },
}

/// Accept-list of notification actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFilter {
    accepted: Vec<String>,
}

impl ActionFilter {
    /// Create a filter accepting exactly `accepted`
    pub fn new<I, S>(accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted: accepted.into_iter().map(Into::into).collect(),
        }
    }

    /// Actions this filter lets through
    pub fn accepted_actions(&self) -> &[String] {
        &self.accepted
    }

    /// Whether a notification with this action should be forwarded.
    ///
    /// A missing action counts as [`DEFAULT_ACTION`].
    pub fn should_process(&self, action: Option<&str>) -> bool {
        let action = action.unwrap_or(DEFAULT_ACTION);
        self.accepted.iter().any(|accepted| accepted == action)
    }

    /// Decide on a parsed notification using its top-level `action` field.
    ///
    /// Non-string actions (including an explicit `null`) are never accepted.
    pub fn evaluate(&self, payload: &Map<String, Value>) -> ActionDecision {
        match payload.get("action") {
            None => self.decide(DEFAULT_ACTION, Value::String(DEFAULT_ACTION.to_string())),
            Some(Value::String(action)) => self.decide(action, Value::String(action.clone())),
            Some(other) => ActionDecision::Ignore {
                action: other.clone(),
            },
        }
    }

    fn decide(&self, action: &str, raw: Value) -> ActionDecision {
        if self.should_process(Some(action)) {
            ActionDecision::Process {
                action: action.to_string(),
            }
        } else {
            ActionDecision::Ignore { action: raw }
        }
    }
}

impl Default for ActionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ACCEPTED_ACTIONS)
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
