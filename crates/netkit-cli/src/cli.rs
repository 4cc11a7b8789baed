//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Netkit CLI - issue HTTP calls through the netkit pipeline
///
/// Requests are augmented with the configured common parameters, routed by
/// connectivity with a stale-cache fallback, and the response envelope is
/// normalized into a single success or error result.
#[derive(Parser, Debug)]
#[command(
    name = "netkit",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "NETKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a request through the pipeline and print the normalized result
    Call(CallArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the call command
#[derive(Parser, Debug)]
pub struct CallArgs {
    /// HTTP method (GET, HEAD, POST, PUT, PATCH, DELETE, OPTIONS)
    #[arg(value_name = "METHOD")]
    pub method: String,

    /// Absolute URL, or a path joined to the configured base URL
    #[arg(value_name = "URL_OR_PATH")]
    pub target: String,

    /// Extra request header as NAME:VALUE
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Query parameter as NAME=VALUE
    #[arg(long = "query", value_name = "NAME=VALUE")]
    pub query: Vec<String>,

    /// JSON request body
    #[arg(long, value_name = "BODY", conflicts_with = "form")]
    pub json: Option<String>,

    /// Form field as NAME=VALUE (sent url-encoded)
    #[arg(long = "form", value_name = "NAME=VALUE")]
    pub form: Vec<String>,

    /// Accept a stale cached response while offline
    #[arg(long)]
    pub allow_stale: bool,

    /// Treat the network as unavailable
    #[arg(long)]
    pub offline: bool,

    /// Do not inject any common parameters
    #[arg(long, conflicts_with_all = ["skip_headers", "skip_query", "skip_body"])]
    pub skip_common: bool,

    /// Do not inject common headers
    #[arg(long)]
    pub skip_headers: bool,

    /// Do not inject common query parameters
    #[arg(long)]
    pub skip_query: bool,

    /// Do not inject common body fields
    #[arg(long)]
    pub skip_body: bool,

    /// How the response body is interpreted
    #[arg(short, long, value_enum, default_value = "envelope")]
    pub mode: CallMode,

    /// Deadline for the whole call in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Response interpretation modes
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CallMode {
    /// Normalize a status/data/message envelope
    Envelope,
    /// Only report whether the envelope signals success
    Boolean,
    /// Decode the body as the payload itself
    Raw,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration inspection actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show(ConfigShowArgs),

    /// Validate the effective configuration
    Validate,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        use is_terminal::IsTerminal;
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl CallArgs {
    /// Per-request opt-outs from common parameter injection
    pub fn capabilities(&self) -> netkit_core::Capabilities {
        if self.skip_common {
            return netkit_core::Capabilities::skipping_all();
        }
        let mut capabilities = netkit_core::Capabilities::default();
        if self.skip_headers {
            capabilities = capabilities.without_headers();
        }
        if self.skip_query {
            capabilities = capabilities.without_query();
        }
        if self.skip_body {
            capabilities = capabilities.without_body();
        }
        capabilities
    }
}
