//! Subcommands module for Setconf CLI
//!
//! This module contains all the subcommand implementations.

pub mod apply;
pub mod drift;
pub mod parse;
pub mod render;

use crate::cli::output::OutputFormatter;
use crate::cli::{Cli, OutputFormat};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use setconf::config::Config;
use setconf::parser::ConfigParser;
use std::io::Read;
use std::path::Path;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &Cli, config: Config) -> Self {
        let output = OutputFormatter::new(!cli.no_color, cli.output, cli.verbosity());

        Self { config, output }
    }

    /// Parser configured from the loaded settings
    pub fn parser(&self) -> ConfigParser {
        ConfigParser::new().strict(self.config.parser.strict)
    }

    /// Report lines a strict parser could not place
    pub fn report_unrecognized(&self, lines: &[String]) {
        for line in lines {
            self.output
                .warning(&format!("unrecognized configuration line: {}", line));
        }
    }
}

/// Read a file, or stdin when the path is `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Load a record from a YAML or JSON file, chosen by extension
pub fn load_record<R: DeserializeOwned>(path: &Path) -> Result<R> {
    let content = read_input(path)?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let record = match extension {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse record file: {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse record file: {}", path.display()))?,
    };
    Ok(record)
}

/// True when output goes to a machine-readable format
pub fn is_machine(format: OutputFormat) -> bool {
    !matches!(format, OutputFormat::Human)
}

/// Call a generic function with the concrete record type for a [`Kind`](crate::cli::Kind)
macro_rules! with_kind {
    ($kind:expr, $f:ident ( $($arg:expr),* )) => {
        match $kind {
            $crate::cli::Kind::AddressPool => {
                $f::<setconf::objects::AddressPool>($($arg),*)
            }
            $crate::cli::Kind::RoutingInstance => {
                $f::<setconf::objects::RoutingInstance>($($arg),*)
            }
            $crate::cli::Kind::DhcpRelayGroup => {
                $f::<setconf::objects::DhcpRelayGroup>($($arg),*)
            }
        }
    };
}

pub(crate) use with_kind;
