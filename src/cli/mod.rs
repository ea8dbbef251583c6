//! CLI module for Setconf
//!
//! Argument parsing and subcommand dispatch for the `setconf` binary.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Setconf - render, read and reconcile set-style device configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "setconf")]
#[command(version)]
#[command(about = "Render, read and reconcile set-style device configuration", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "SETCONF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
    /// YAML output
    Yaml,
}

/// Object kinds the CLI can handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// access address-assignment pool
    AddressPool,
    /// routing-instances
    RoutingInstance,
    /// forwarding-options dhcp-relay group
    DhcpRelayGroup,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render a record file as set lines
    Render(commands::render::RenderArgs),

    /// Parse device output into a record
    Parse(commands::parse::ParseArgs),

    /// Compare a record file with device output
    Drift(commands::drift::DriftArgs),

    /// Run a transaction against an offline device snapshot
    Apply(commands::apply::ApplyArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "setconf",
            "render",
            "--kind",
            "address-pool",
            "pool.yml",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Render(_)));
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from([
            "setconf",
            "-vvvv",
            "parse",
            "--kind",
            "routing-instance",
            "out.txt",
        ])
        .unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_output_format() {
        let cli = Cli::try_parse_from([
            "setconf",
            "--output",
            "json",
            "drift",
            "--kind",
            "dhcp-relay-group",
            "desired.yml",
            "actual.txt",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
    }
}
