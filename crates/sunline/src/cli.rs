//! Clap derive structures for the `sunline` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sunline -- webcam previews and the edge image gateway
#[derive(Debug, Parser)]
#[command(
    name = "sunline",
    version,
    about = "Resolve webcam previews and run the edge image gateway",
    long_about = "Lists the webcam catalogue, resolves each webcam to a preview URL \
        (direct, proxied snapshot, or HTML image extraction), probes previews with \
        the client retry schedule, and serves the allowlisted image gateway.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Webcam catalogue (YAML) [default: webcams.yaml]
    #[arg(long, short = 'c', env = "SUNLINE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Gateway base URL (overrides settings.worker_base_url)
    #[arg(long, short = 'w', env = "SUNLINE_WORKER_URL", global = true)]
    pub worker_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SUNLINE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Log line format
    #[arg(long, env = "SUNLINE_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the edge image gateway
    Serve(ServeArgs),

    /// List webcams with distance, bearing, and preview strategy
    #[command(alias = "ls")]
    Webcams(WebcamsArgs),

    /// Print the resolved preview URL for a webcam
    Preview(PreviewArgs),

    /// Fetch a webcam's preview, retrying on the client schedule
    Probe(ProbeArgs),

    /// Validate a webcam catalogue and report every issue
    Validate(ValidateArgs),

    /// Inspect gateway settings
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SERVE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind (overrides settings)
    #[arg(long, short = 'l')]
    pub listen: Option<SocketAddr>,

    /// Extra allowlisted host (repeatable)
    #[arg(long = "allow-host", value_name = "HOST")]
    pub allow_hosts: Vec<String>,

    /// Upstream fetch timeout in seconds
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,

    /// Gateway settings file (TOML)
    #[arg(long)]
    pub gateway_config: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WEBCAMS / PREVIEW / PROBE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WebcamsArgs {
    /// Sort order
    #[arg(long, short = 's', default_value = "distance")]
    pub sort: WebcamSort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WebcamSort {
    /// Nearest to the user coordinate first
    Distance,
    /// Alphabetical by name
    Name,
    /// Highest first
    Elevation,
    /// Catalogue order
    Catalogue,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Webcam id
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Webcam id
    pub id: String,

    /// Give up after the first failed attempt
    #[arg(long)]
    pub no_retry: bool,

    /// Per-attempt request timeout in seconds
    #[arg(long, default_value = "10")]
    pub timeout: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VALIDATE / CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Catalogue to check (defaults to --config)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective gateway settings
    Show {
        /// Gateway settings file (TOML)
        #[arg(long)]
        gateway_config: Option<PathBuf>,
    },

    /// Print the default gateway settings path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
