//! Outbound request shapes for the two GitHub automation endpoints.

use crate::payload::CrashMetadata;
use serde_json::{json, Value};

/// Builds the endpoint path and JSON body for one dispatch variant
///
/// Implementations only describe the request. Authentication, transport and
/// result classification belong to [`DispatchForwarder`](super::DispatchForwarder).
pub trait DispatchStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Path segments below the API base URL, unencoded
    fn path_segments(&self, owner: &str, repo: &str) -> Vec<String>;

    /// JSON body carrying the crash metadata
    fn request_body(&self, metadata: &CrashMetadata) -> Value;

    /// Names of variant-specific settings that are missing
    fn missing_settings(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

fn metadata_fields(metadata: &CrashMetadata) -> Value {
    json!({
        "title": metadata.title,
        "culprit": metadata.culprit,
        "level": metadata.level,
        "url": metadata.url,
    })
}

// ============================================================================
// Workflow dispatch
// ============================================================================

/// Triggers a `workflow_dispatch` run of a single workflow file
///
/// `POST /repos/{owner}/{repo}/actions/workflows/{file}/dispatches` with
/// `{"ref": ..., "inputs": {title, culprit, level, url}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDispatch {
    workflow_file: String,
    git_ref: String,
}

impl WorkflowDispatch {
    pub fn new(workflow_file: impl Into<String>, git_ref: impl Into<String>) -> Self {
        Self {
            workflow_file: workflow_file.into(),
            git_ref: git_ref.into(),
        }
    }
}

impl DispatchStrategy for WorkflowDispatch {
    fn name(&self) -> &'static str {
        "workflow_dispatch"
    }

    fn path_segments(&self, owner: &str, repo: &str) -> Vec<String> {
        vec![
            "repos".to_string(),
            owner.to_string(),
            repo.to_string(),
            "actions".to_string(),
            "workflows".to_string(),
            self.workflow_file.clone(),
            "dispatches".to_string(),
        ]
    }

    fn request_body(&self, metadata: &CrashMetadata) -> Value {
        json!({
            "ref": self.git_ref,
            "inputs": metadata_fields(metadata),
        })
    }

    fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.workflow_file.trim().is_empty() {
            missing.push("GH_WORKFLOW_FILE");
        }
        if self.git_ref.trim().is_empty() {
            missing.push("GH_REF");
        }
        missing
    }
}

// ============================================================================
// Repository dispatch
// ============================================================================

/// Sends a `repository_dispatch` event any workflow in the repository can
/// subscribe to
///
/// `POST /repos/{owner}/{repo}/dispatches` with
/// `{"event_type": ..., "client_payload": {title, culprit, level, url}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryEventDispatch {
    event_type: String,
}

impl RepositoryEventDispatch {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
        }
    }
}

impl DispatchStrategy for RepositoryEventDispatch {
    fn name(&self) -> &'static str {
        "repository_dispatch"
    }

    fn path_segments(&self, owner: &str, repo: &str) -> Vec<String> {
        vec![
            "repos".to_string(),
            owner.to_string(),
            repo.to_string(),
            "dispatches".to_string(),
        ]
    }

    fn request_body(&self, metadata: &CrashMetadata) -> Value {
        json!({
            "event_type": self.event_type,
            "client_payload": metadata_fields(metadata),
        })
    }

    fn missing_settings(&self) -> Vec<&'static str> {
        if self.event_type.trim().is_empty() {
            vec!["GH_EVENT_TYPE"]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
