//! Tests for the [`CrashRelay`] pipeline.

use super::*;
use crate::config::{DispatchTarget, SecretValue};
use crate::signature::compute_signature;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

const SECRET: &str = "relay-test-secret";

fn integration_config(api_base_url: &str, secret: &str) -> IntegrationConfig {
    IntegrationConfig {
        sentry_client_secret: SecretValue::from(secret),
        github_token: SecretValue::from("ghp_test_token"),
        github_owner: "octo".to_string(),
        github_repo: "crashy-app".to_string(),
        api_base_url: api_base_url.to_string(),
        request_timeout_seconds: 10,
        dispatch: DispatchTarget::default(),
    }
}

fn relay_for(config: IntegrationConfig) -> CrashRelay {
    CrashRelay::from_config(Arc::new(config), ActionFilter::default()).unwrap()
}

fn signed_notification(secret: &str, body: &[u8]) -> InboundNotification {
    let mut headers = HashMap::new();
    headers.insert(
        SIGNATURE_HEADER.to_string(),
        compute_signature(secret.as_bytes(), body),
    );
    headers.insert(RESOURCE_HEADER.to_string(), "issue".to_string());
    InboundNotification::from_http_headers(&headers, Bytes::copy_from_slice(body))
}

fn issue_created_body() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "action": "created",
        "data": {
            "issue": {
                "title": "ZeroDivisionError: division by zero",
                "culprit": "tasks.views in trigger_test_crash",
                "level": "error",
                "web_url": "https://demo.sentry.io/issues/fake-001/"
            }
        },
        "installation": { "uuid": "simulate-crash-test" }
    }))
    .unwrap()
}

async fn mount_dispatch(mock_server: &MockServer, status: u16, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(
            "/repos/octo/crashy-app/actions/workflows/sentry-crash-triage.lock.yml/dispatches",
        ))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected_calls)
        .mount(mock_server)
        .await;
}

// ============================================================================
// Header parsing
// ============================================================================

#[test]
fn test_from_http_headers_reads_sentry_headers() {
    let mut headers = HashMap::new();
    headers.insert("sentry-hook-signature".to_string(), "abc".to_string());
    headers.insert("sentry-hook-resource".to_string(), "event_alert".to_string());
    headers.insert("content-type".to_string(), "application/json".to_string());

    let notification = InboundNotification::from_http_headers(&headers, Bytes::from_static(b"{}"));

    assert_eq!(notification.signature(), Some("abc"));
    assert_eq!(notification.resource.as_deref(), Some("event_alert"));
    assert_eq!(&notification.body[..], b"{}");
}

#[test]
fn test_from_http_headers_without_signature() {
    let notification =
        InboundNotification::from_http_headers(&HashMap::new(), Bytes::from_static(b"{}"));
    assert_eq!(notification.signature(), None);
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_signed_created_issue_is_dispatched() {
    let mock_server = MockServer::start().await;
    mount_dispatch(&mock_server, 204, 1).await;

    let relay = relay_for(integration_config(&mock_server.uri(), SECRET));
    let body = issue_created_body();

    let outcome = relay
        .process_notification(signed_notification(SECRET, &body))
        .await
        .expect("pipeline should succeed");

    match outcome {
        RelayOutcome::Dispatched(dispatched) => {
            assert_eq!(dispatched.title, "ZeroDivisionError: division by zero");
            assert_eq!(dispatched.culprit, "tasks.views in trigger_test_crash");
            assert_eq!(dispatched.level, "error");
        }
        other => panic!("expected Dispatched, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bad_signature_rejected_before_dispatch() {
    let mock_server = MockServer::start().await;
    mount_dispatch(&mock_server, 204, 0).await;

    let relay = relay_for(integration_config(&mock_server.uri(), SECRET));
    let body = issue_created_body();

    let result = relay
        .process_notification(signed_notification("another-secret", &body))
        .await;

    assert!(matches!(
        result,
        Err(RelayError::InvalidSignature {
            reason: RejectionReason::Mismatch
        })
    ));
}

#[tokio::test]
async fn test_unsigned_request_rejected_when_secret_configured() {
    let mock_server = MockServer::start().await;
    mount_dispatch(&mock_server, 204, 0).await;

    let relay = relay_for(integration_config(&mock_server.uri(), SECRET));
    let notification =
        InboundNotification::from_http_headers(&HashMap::new(), Bytes::from(issue_created_body()));

    let result = relay.process_notification(notification).await;

    assert!(matches!(
        result,
        Err(RelayError::InvalidSignature {
            reason: RejectionReason::MissingHeader
        })
    ));
}

#[tokio::test]
async fn test_unsigned_request_accepted_without_secret() {
    let mock_server = MockServer::start().await;
    mount_dispatch(&mock_server, 204, 1).await;

    let relay = relay_for(integration_config(&mock_server.uri(), ""));
    let notification =
        InboundNotification::from_http_headers(&HashMap::new(), Bytes::from(issue_created_body()));

    let result = relay.process_notification(notification).await;

    assert!(matches!(result, Ok(RelayOutcome::Dispatched(_))));
}

#[tokio::test]
async fn test_signed_invalid_json_is_malformed() {
    let mock_server = MockServer::start().await;
    mount_dispatch(&mock_server, 204, 0).await;

    let relay = relay_for(integration_config(&mock_server.uri(), SECRET));

    for body in [&b"not json"[..], b"[1,2,3]", b"\"string\"", b""] {
        let result = relay
            .process_notification(signed_notification(SECRET, body))
            .await;
        assert!(
            matches!(result, Err(RelayError::MalformedPayload { .. })),
            "body {:?} should be malformed, got {:?}",
            String::from_utf8_lossy(body),
            result
        );
    }
}

#[tokio::test]
async fn test_resolved_action_is_ignored() {
    let mock_server = MockServer::start().await;
    mount_dispatch(&mock_server, 204, 0).await;

    let relay = relay_for(integration_config(&mock_server.uri(), SECRET));
    let body = serde_json::to_vec(&json!({
        "action": "resolved",
        "data": { "issue": { "title": "fixed" } }
    }))
    .unwrap();

    let outcome = relay
        .process_notification(signed_notification(SECRET, &body))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RelayOutcome::Ignored {
            action: json!("resolved")
        }
    );
}

#[tokio::test]
async fn test_missing_credentials_surface_as_configuration_error() {
    let mock_server = MockServer::start().await;
    mount_dispatch(&mock_server, 204, 0).await;

    let mut config = integration_config(&mock_server.uri(), SECRET);
    config.github_token = SecretValue::default();
    let relay = relay_for(config);
    let body = issue_created_body();

    let result = relay
        .process_notification(signed_notification(SECRET, &body))
        .await;

    match result {
        Err(error @ RelayError::Dispatch(DispatchError::Configuration { .. })) => {
            assert_eq!(error.error_category(), ErrorCategory::Configuration);
        }
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_upstream_failure_propagates() {
    let mock_server = MockServer::start().await;
    mount_dispatch(&mock_server, 422, 1).await;

    let relay = relay_for(integration_config(&mock_server.uri(), SECRET));
    let body = issue_created_body();

    let result = relay
        .process_notification(signed_notification(SECRET, &body))
        .await;

    assert!(matches!(
        result,
        Err(RelayError::Dispatch(DispatchError::Upstream { status: 422, .. }))
    ));
}

#[test]
fn test_error_categories() {
    assert_eq!(
        RelayError::InvalidSignature {
            reason: RejectionReason::Mismatch
        }
        .error_category(),
        ErrorCategory::Security
    );
    assert_eq!(
        RelayError::MalformedPayload {
            message: "x".to_string()
        }
        .error_category(),
        ErrorCategory::Permanent
    );
}

#[test]
fn test_dispatch_strategy_follows_configuration() {
    let workflow = relay_for(integration_config("https://api.github.com", SECRET));
    assert_eq!(workflow.dispatch_strategy(), "workflow_dispatch");

    let mut config = integration_config("https://api.github.com", SECRET);
    config.dispatch = DispatchTarget::RepositoryEvent {
        event_type: "sentry-crash".to_string(),
    };
    assert_eq!(relay_for(config).dispatch_strategy(), "repository_dispatch");
}
