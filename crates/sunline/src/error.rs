//! CLI error types with miette diagnostics.
//!
//! Maps config, gateway, and probe failures into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use sunline_config::ConfigError;
use sunline_core::AppError;
use sunline_gateway::GatewayError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UPSTREAM: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────

    #[error("{path}: {source}")]
    #[diagnostic(code(sunline::config))]
    Config {
        path: String,
        #[source]
        source: ConfigError,
        #[help]
        details: Option<String>,
    },

    // ── Catalogue lookups ────────────────────────────────────────────

    #[error("Webcam '{id}' not found")]
    #[diagnostic(
        code(sunline::not_found),
        help("Run: sunline webcams to see available ids")
    )]
    WebcamNotFound { id: String },

    #[error("Webcam '{id}' has no preview ({kind} source)")]
    #[diagnostic(
        code(sunline::no_preview),
        help("Only snapshot and page sources can be previewed.")
    )]
    NoPreview { id: String, kind: String },

    // ── Probe ────────────────────────────────────────────────────────

    #[error("Preview failed after {attempts} attempt(s): {reason}")]
    #[diagnostic(
        code(sunline::probe_failed),
        help("URL: {url}\nCheck that the gateway is running and the host is allowlisted.")
    )]
    ProbeFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    // ── Gateway ──────────────────────────────────────────────────────

    #[error("Could not bind gateway to {addr}")]
    #[diagnostic(
        code(sunline::bind),
        help("Is another process listening there? Choose one with --listen.")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(sunline::gateway))]
    Gateway(#[from] GatewayError),

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sunline::validation))]
    Validation { field: String, reason: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    #[diagnostic(code(sunline::http))]
    Http(#[from] reqwest::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Wrap a config error, listing validation issues in the help text.
    pub fn config(path: impl Into<String>, source: ConfigError) -> Self {
        let details = match source.issues() {
            [] => None,
            issues => Some(issues.join("\n")),
        };
        Self::Config {
            path: path.into(),
            source,
            details,
        }
    }

    /// Failure reported by the probe loop, preferring the gateway's own
    /// error body when it sent one.
    pub fn probe(url: impl Into<String>, attempts: u32, failure: &ProbeFailure) -> Self {
        Self::ProbeFailed {
            url: url.into(),
            attempts,
            reason: failure.to_string(),
        }
    }

    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => exit_code::CONFIG,
            Self::WebcamNotFound { .. } | Self::NoPreview { .. } => exit_code::NOT_FOUND,
            Self::ProbeFailed { .. } | Self::Http(_) => exit_code::UPSTREAM,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

/// A single failed probe attempt.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    /// The gateway answered with its JSON error body.
    #[error("{0}")]
    Gateway(AppError),

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("{0}")]
    Transport(String),
}
