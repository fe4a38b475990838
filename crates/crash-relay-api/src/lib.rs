//! # Crash Relay HTTP Service
//!
//! HTTP server receiving Sentry webhooks and relaying crash notifications to
//! GitHub automation.
//!
//! This service provides:
//! - Sentry webhook endpoint (with and without trailing slash)
//! - Health check endpoint
//!
//! Handler panics are turned into a generic `500` JSON response; the server
//! keeps running.

pub mod config;
pub mod errors;
pub mod responses;

pub use config::{ConfigError, LoggingConfig, ServerConfig, ServiceConfig, WebhookConfig};
pub use errors::{ServiceError, WebhookHandlerError};
pub use responses::{HealthResponse, WebhookResponse};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use crash_relay_core::{InboundNotification, NotificationProcessor};
use std::{any::Any, collections::HashMap, net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info, instrument};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub processor: Arc<dyn NotificationProcessor>,
}

impl AppState {
    pub fn new(config: ServiceConfig, processor: Arc<dyn NotificationProcessor>) -> Self {
        Self {
            config: Arc::new(config),
            processor,
        }
    }
}

// ============================================================================
// Router and Server
// ============================================================================

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    let webhook_path = state.config.webhook.canonical_path().to_string();

    let webhook_routes = Router::new()
        .route(&webhook_path, post(handle_sentry_webhook))
        .route(&format!("{}/", webhook_path), post(handle_sentry_webhook));

    let health_routes = Router::new().route("/health", get(handle_health_check));

    Router::new()
        .merge(webhook_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(DefaultBodyLimit::max(state.config.server.max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// Runs until SIGINT or SIGTERM. In-flight requests are allowed to finish.
pub async fn start_server(
    config: ServiceConfig,
    processor: Arc<dyn NotificationProcessor>,
) -> Result<(), ServiceError> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let addr: SocketAddr = address.parse().map_err(|e| ServiceError::BindFailed {
        address: address.clone(),
        message: format!("invalid listen address: {}", e),
    })?;

    let app = create_router(AppState::new(config, processor));

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
///
/// A signal handler that cannot be installed never resolves, so the other
/// one still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Handle a Sentry webhook delivery
#[instrument(skip(state, headers, body), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn handle_sentry_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    info!(body_size = body.len(), "Received Sentry webhook request");

    let header_map: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_lowercase(),
                v.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();

    let notification = InboundNotification::from_http_headers(&header_map, body);

    let outcome = state.processor.process_notification(notification).await?;

    Ok(Json(WebhookResponse::from(outcome)))
}

/// Liveness probe
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Turn a handler panic into a generic 500 response
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    WebhookHandlerError::InternalError {
        message: format!("request handler panicked: {}", detail),
    }
    .into_response()
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
