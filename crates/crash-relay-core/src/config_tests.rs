use super::*;
use serde_json::json;

// ============================================================================
// SecretValue
// ============================================================================

#[test]
fn test_secret_debug_is_redacted() {
    let secret = SecretValue::from("ghp_super_secret");
    let debug_output = format!("{:?}", secret);

    assert!(debug_output.contains("[REDACTED]"));
    assert!(!debug_output.contains("ghp_super_secret"));
    assert_eq!(secret.len(), 16);
}

#[test]
fn test_secret_serializes_as_redaction_marker() {
    let serialized = serde_json::to_value(SecretValue::from("value")).unwrap();
    assert_eq!(serialized, json!("[REDACTED]"));

    let serialized = serde_json::to_value(SecretValue::default()).unwrap();
    assert_eq!(serialized, json!(""));
}

#[test]
fn test_secret_deserializes_from_plain_string() {
    let secret: SecretValue = serde_json::from_value(json!("abc")).unwrap();
    assert_eq!(secret.expose_secret(), "abc");
    assert_eq!(secret.expose_bytes(), b"abc");
}

// ============================================================================
// IntegrationConfig
// ============================================================================

#[test]
fn test_defaults() {
    let config = IntegrationConfig::default();

    assert!(!config.verification_enabled());
    assert_eq!(config.api_base_url, "https://api.github.com");
    assert_eq!(config.request_timeout(), Duration::from_secs(10));
    assert_eq!(
        config.dispatch,
        DispatchTarget::Workflow {
            workflow_file: "sentry-crash-triage.lock.yml".to_string(),
            git_ref: "main".to_string(),
        }
    );
    assert_eq!(
        config.missing_github_settings(),
        vec!["GH_PAT", "GH_OWNER", "GH_REPO"]
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_deserialize_partial_config_fills_defaults() {
    let config: IntegrationConfig = serde_json::from_value(json!({
        "sentry_client_secret": "s",
        "github_token": "t",
        "github_owner": "octo",
        "github_repo": "app"
    }))
    .unwrap();

    assert!(config.verification_enabled());
    assert!(config.missing_github_settings().is_empty());
    assert_eq!(config.request_timeout_seconds, 10);
    assert!(matches!(config.dispatch, DispatchTarget::Workflow { .. }));
}

#[test]
fn test_deserialize_repository_event_target() {
    let config: IntegrationConfig = serde_json::from_value(json!({
        "dispatch": { "mode": "repository_event" }
    }))
    .unwrap();

    assert_eq!(
        config.dispatch,
        DispatchTarget::RepositoryEvent {
            event_type: "sentry-crash".to_string()
        }
    );
    assert_eq!(config.dispatch.to_strategy().name(), "repository_dispatch");
}

#[test]
fn test_deserialize_workflow_target_overrides() {
    let target: DispatchTarget = serde_json::from_value(json!({
        "mode": "workflow",
        "workflow_file": "triage.yml",
        "git_ref": "develop"
    }))
    .unwrap();

    assert_eq!(
        target,
        DispatchTarget::Workflow {
            workflow_file: "triage.yml".to_string(),
            git_ref: "develop".to_string(),
        }
    );
    assert_eq!(target.to_strategy().name(), "workflow_dispatch");
}

#[test]
fn test_unknown_dispatch_mode_rejected() {
    let result: Result<DispatchTarget, _> = serde_json::from_value(json!({ "mode": "email" }));
    assert!(result.is_err());
}

#[test]
fn test_whitespace_owner_counts_as_missing() {
    let config = IntegrationConfig {
        github_token: SecretValue::from("t"),
        github_owner: "  ".to_string(),
        github_repo: "app".to_string(),
        ..IntegrationConfig::default()
    };
    assert_eq!(config.missing_github_settings(), vec!["GH_OWNER"]);
}

#[test]
fn test_validate_rejects_bad_base_url() {
    for url in ["not a url", "ftp://example.com", ""] {
        let config = IntegrationConfig {
            api_base_url: url.to_string(),
            ..IntegrationConfig::default()
        };
        assert!(
            matches!(
                config.validate(),
                Err(IntegrationConfigError::InvalidApiBaseUrl { .. })
            ),
            "'{}' should be rejected",
            url
        );
    }
}

#[test]
fn test_validate_rejects_zero_timeout() {
    let config = IntegrationConfig {
        request_timeout_seconds: 0,
        ..IntegrationConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(IntegrationConfigError::InvalidTimeout)
    ));
}

#[test]
fn test_debug_output_hides_credentials() {
    let config = IntegrationConfig {
        sentry_client_secret: SecretValue::from("sentry-secret-value"),
        github_token: SecretValue::from("ghp_token_value"),
        ..IntegrationConfig::default()
    };
    let debug_output = format!("{:?}", config);

    assert!(!debug_output.contains("sentry-secret-value"));
    assert!(!debug_output.contains("ghp_token_value"));
}
