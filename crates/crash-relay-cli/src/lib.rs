//! # Crash Relay CLI
//!
//! Command-line tools for operating the crash relay.
//!
//! This module provides CLI commands for:
//! - Sending a simulated Sentry crash notification to a running relay
//! - Signing a payload file the way Sentry does
//! - Validating and showing the resolved service configuration

use clap::{Args, Parser, Subcommand};
use crash_relay_api::{ConfigError, ServiceConfig};
use crash_relay_core::{
    relay::RESOURCE_HEADER,
    signature::{compute_signature, SIGNATURE_HEADER},
};
use std::{io::Read, path::PathBuf, time::Duration};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Default relay endpoint for `simulate`
pub const DEFAULT_WEBHOOK_URL: &str = "http://127.0.0.1:8000/webhooks/sentry/";

/// Header carrying the Unix time the notification was sent
pub const TIMESTAMP_HEADER: &str = "sentry-hook-timestamp";

/// Signature sent when no secret is available
pub const UNSIGNED_PLACEHOLDER: &str = "no-secret";

const DEFAULT_TITLE: &str = "ZeroDivisionError: division by zero";
const DEFAULT_CULPRIT: &str = "tasks.views in trigger_test_crash";
const FAKE_ISSUE_URL: &str = "https://demo.sentry.io/issues/fake-001/";

// ============================================================================
// CLI Structure
// ============================================================================

/// Crash Relay CLI - Sentry crash notifications to GitHub automation
#[derive(Parser)]
#[command(name = "crash-relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator tools for the Sentry to GitHub crash relay")]
pub struct Cli {
    /// Logging level
    #[arg(short, long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Send a fake "issue created" notification to a running relay
    Simulate(SimulateArgs),

    /// Print the signature Sentry would send for a file (`-` reads stdin)
    Sign {
        /// Shared Sentry client secret
        #[arg(long, env = "SENTRY_CLIENT_SECRET", hide_env_values = true)]
        secret: String,

        /// File whose exact bytes are signed
        file: PathBuf,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Load the layered service configuration and validate it
    Validate {
        /// Configuration file to load in addition to the default locations
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the resolved configuration as JSON with secrets redacted
    Show {
        /// Configuration file to load in addition to the default locations
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Options for `simulate`
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Relay endpoint to post to
    #[arg(long, env = "WEBHOOK_URL", default_value = DEFAULT_WEBHOOK_URL)]
    pub url: String,

    /// Shared Sentry client secret; unsigned when empty
    #[arg(
        long,
        env = "SENTRY_CLIENT_SECRET",
        hide_env_values = true,
        default_value = ""
    )]
    pub secret: String,

    /// Issue title
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Issue culprit
    #[arg(long, default_value = DEFAULT_CULPRIT)]
    pub culprit: String,

    /// Issue level
    #[arg(long, default_value = "error")]
    pub level: String,

    /// Notification action
    #[arg(long, default_value = "created")]
    pub action: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout_seconds: u64,
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::RequestFailed { .. } => 2,
            Self::CommandFailed { .. } => 3,
            Self::InvalidArgument { .. } => 4,
            Self::Io(_) => 5,
            Self::Serialization(_) => 6,
        }
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Fake Sentry "issue created" notification
pub fn fake_payload(args: &SimulateArgs) -> serde_json::Value {
    serde_json::json!({
        "action": args.action,
        "data": {
            "issue": {
                "id": "fake-issue-001",
                "title": args.title,
                "culprit": args.culprit,
                "level": args.level,
                "status": "unresolved",
                "web_url": FAKE_ISSUE_URL,
                "permalink": FAKE_ISSUE_URL,
            }
        },
        "installation": { "uuid": "simulate-crash-test" },
    })
}

/// Request body and headers for one simulated notification
#[derive(Debug, Clone)]
pub struct SimulatedRequest {
    pub body: Vec<u8>,
    pub signature: String,
    pub timestamp: i64,
    pub signed: bool,
}

impl SimulatedRequest {
    pub fn build(args: &SimulateArgs) -> Result<Self, CliError> {
        let body = serde_json::to_vec(&fake_payload(args))?;
        let signed = !args.secret.is_empty();
        let signature = if signed {
            compute_signature(args.secret.as_bytes(), &body)
        } else {
            UNSIGNED_PLACEHOLDER.to_string()
        };

        Ok(Self {
            body,
            signature,
            timestamp: chrono::Utc::now().timestamp(),
            signed,
        })
    }
}

/// What the relay answered
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub status: u16,
    pub body: String,
}

impl SimulationReport {
    /// Response body pretty-printed when it is JSON, verbatim otherwise
    pub fn display_body(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| self.body.clone())
    }
}

/// POST a simulated notification to the relay
pub async fn send_simulation(
    args: &SimulateArgs,
    request: &SimulatedRequest,
) -> Result<SimulationReport, CliError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout_seconds))
        .build()
        .map_err(|e| CliError::CommandFailed {
            message: format!("failed to create HTTP client: {}", e),
        })?;

    debug!(url = %args.url, signed = request.signed, "Sending simulated notification");

    let response = client
        .post(&args.url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .header(SIGNATURE_HEADER, &request.signature)
        .header(RESOURCE_HEADER, "issue")
        .header(TIMESTAMP_HEADER, request.timestamp.to_string())
        .body(request.body.clone())
        .send()
        .await
        .map_err(|e| {
            let message = if e.is_timeout() {
                format!("Request timed out after {} s", args.timeout_seconds)
            } else if e.is_connect() {
                format!(
                    "Could not connect to {}. Is the relay service running?",
                    args.url
                )
            } else {
                e.to_string()
            };
            CliError::RequestFailed { message }
        })?;

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    Ok(SimulationReport { status, body })
}

/// Operator hint for a relay response status
pub fn guidance(status: u16) -> String {
    match status {
        200 => "Pipeline triggered. Check the Actions tab of the target repository \
                for the new workflow run."
            .to_string(),
        403 => "Signature mismatch. Check that SENTRY_CLIENT_SECRET matches the relay's secret."
            .to_string(),
        400 => "The relay could not parse the payload as a JSON object.".to_string(),
        500 => "The relay reported a server-side problem. Check that GH_PAT, GH_OWNER \
                and GH_REPO are set for the service."
            .to_string(),
        502 => "GitHub rejected the dispatch or could not be reached. See the response detail."
            .to_string(),
        other => format!("Unexpected status {}", other),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli);

    match cli.command {
        Commands::Simulate(args) => execute_simulate_command(&args).await,
        Commands::Sign { secret, file } => execute_sign_command(&secret, &file),
        Commands::Config { action } => execute_config_command(action),
    }
}

/// Log to stderr so command output on stdout stays clean
fn initialize_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded; keep that one.
    let _ = if cli.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

async fn execute_simulate_command(args: &SimulateArgs) -> Result<(), CliError> {
    let request = SimulatedRequest::build(args)?;

    let rule = "=".repeat(60);
    println!("\n{}", rule);
    println!("  Sentry Crash Pipeline Simulator");
    println!("{}", rule);
    println!("  Target  : {}", args.url);
    println!("  Title   : {}", args.title);
    println!("  Culprit : {}", args.culprit);
    println!(
        "  Signed  : {}",
        if request.signed {
            "yes"
        } else {
            "no (missing secret)"
        }
    );
    println!("{}\n", rule);

    if !request.signed {
        println!("SENTRY_CLIENT_SECRET not set; sending the placeholder signature.");
        println!("A relay without a secret accepts it; one with a secret answers 403.\n");
    }

    let report = send_simulation(args, &request).await?;

    println!("HTTP {}", report.status);
    println!("Response: {}", report.display_body());
    println!("\n{}", guidance(report.status));

    if (200..300).contains(&report.status) {
        Ok(())
    } else {
        Err(CliError::CommandFailed {
            message: format!("relay answered HTTP {}", report.status),
        })
    }
}

/// Signature for the bytes of `file`, or stdin when `file` is `-`
pub fn sign_file(secret: &str, file: &std::path::Path) -> Result<String, CliError> {
    if secret.is_empty() {
        return Err(CliError::InvalidArgument {
            arg: "--secret".to_string(),
            message: "secret must not be empty".to_string(),
        });
    }

    let body = if file.as_os_str() == "-" {
        let mut buffer = Vec::new();
        std::io::stdin().read_to_end(&mut buffer)?;
        buffer
    } else {
        std::fs::read(file)?
    };

    Ok(compute_signature(secret.as_bytes(), &body))
}

fn execute_sign_command(secret: &str, file: &std::path::Path) -> Result<(), CliError> {
    let signature = sign_file(secret, file)?;
    println!("{}", signature);
    Ok(())
}

/// Load and validate the layered configuration, returning operator warnings
pub fn validate_configuration(file: Option<&std::path::Path>) -> Result<Vec<String>, CliError> {
    let config = ServiceConfig::load(file)?;
    config.validate()?;

    let mut warnings = Vec::new();
    if !config.integration.verification_enabled() {
        warnings.push("signature verification is disabled (no SENTRY_CLIENT_SECRET)".to_string());
    }
    let missing = config.integration.missing_github_settings();
    if !missing.is_empty() {
        warnings.push(format!("GitHub settings missing: {}", missing.join(", ")));
    }

    Ok(warnings)
}

fn execute_config_command(action: ConfigCommands) -> Result<(), CliError> {
    match action {
        ConfigCommands::Validate { file } => {
            let warnings = validate_configuration(file.as_deref())?;
            info!(warnings = warnings.len(), "Configuration validated");
            println!("Configuration is valid");
            for warning in warnings {
                println!("  warning: {}", warning);
            }
            Ok(())
        }
        ConfigCommands::Show { file } => {
            let config = ServiceConfig::load(file.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
