//! Common test utilities for crash-relay integration tests
//!
//! This module provides:
//! - Service configuration pointing at a mock GitHub API
//! - Router construction with the real relay pipeline
//! - Signed request and payload builders

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use crash_relay_api::{create_router, AppState, ServiceConfig};
use crash_relay_core::{
    signature::compute_signature, CrashRelay, DispatchTarget, SecretValue,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub const SECRET: &str = "integration-test-secret";
pub const TOKEN: &str = "ghp_integration_token";
pub const OWNER: &str = "octo";
pub const REPO: &str = "crashy-app";
pub const WORKFLOW_PATH: &str =
    "/repos/octo/crashy-app/actions/workflows/sentry-crash-triage.lock.yml/dispatches";
pub const REPOSITORY_DISPATCH_PATH: &str = "/repos/octo/crashy-app/dispatches";

// ============================================================================
// Configuration and router
// ============================================================================

/// Fully configured service pointing at `github_url`
pub fn relay_config(github_url: &str, secret: &str) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.integration.sentry_client_secret = SecretValue::from(secret);
    config.integration.github_token = SecretValue::from(TOKEN);
    config.integration.github_owner = OWNER.to_string();
    config.integration.github_repo = REPO.to_string();
    config.integration.api_base_url = github_url.to_string();
    config
}

/// Same as [`relay_config`] but sending repository dispatch events
pub fn repository_event_config(github_url: &str, secret: &str) -> ServiceConfig {
    let mut config = relay_config(github_url, secret);
    config.integration.dispatch = DispatchTarget::RepositoryEvent {
        event_type: "sentry-crash".to_string(),
    };
    config
}

/// Router wired to the real relay pipeline
pub fn create_app(config: ServiceConfig) -> Router {
    let relay = CrashRelay::from_config(
        Arc::new(config.integration.clone()),
        config.webhook.action_filter(),
    )
    .expect("relay should build from test configuration");

    create_router(AppState::new(config, Arc::new(relay)))
}

// ============================================================================
// Requests
// ============================================================================

/// POST `body` signed with `secret`
pub fn signed_request(uri: &str, body: &[u8], secret: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("sentry-hook-resource", "issue")
        .header("sentry-hook-timestamp", "1700000000")
        .header(
            "sentry-hook-signature",
            compute_signature(secret.as_bytes(), body),
        )
        .body(Body::from(body.to_vec()))
        .unwrap()
}

/// POST `body` without a signature header
pub fn unsigned_request(uri: &str, body: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_vec()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ============================================================================
// Payloads
// ============================================================================

/// Issue alert as Sentry sends it on issue creation
pub fn issue_payload(action: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "action": action,
        "data": {
            "issue": {
                "id": "fake-issue-001",
                "title": "ZeroDivisionError: division by zero",
                "culprit": "tasks.views in trigger_test_crash",
                "level": "error",
                "status": "unresolved",
                "web_url": "https://demo.sentry.io/issues/fake-001/",
                "permalink": "https://demo.sentry.io/issues/fake-001/"
            }
        },
        "installation": { "uuid": "integration-test" }
    }))
    .unwrap()
}

/// Event alert carrying an `event` instead of an `issue`
pub fn event_alert_payload() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "action": "triggered",
        "data": {
            "event": {
                "title": "KeyError: 'user_id'",
                "culprit": "api.handlers in get_user",
                "level": "fatal",
                "url": "https://demo.sentry.io/events/abc/"
            },
            "triggered_rule": "Crash alert"
        }
    }))
    .unwrap()
}

/// Decode a JSON response body
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
