//! Output formatting module for Setconf
//!
//! Human output is colored text; JSON and YAML modes print one document per
//! command on stdout and report messages as JSON on stderr.

use super::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use setconf::line::{Operation, PathLine};

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Selected format
    format: OutputFormat,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, format: OutputFormat, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            format,
            verbosity,
        }
    }

    /// Selected format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn machine(&self) -> bool {
        !matches!(self.format, OutputFormat::Human)
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.machine() {
            let err = serde_json::json!({ "type": "error", "message": message });
            eprintln!("{}", err);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.machine() {
            let warn = serde_json::json!({ "type": "warning", "message": message });
            eprintln!("{}", warn);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.machine() {
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "INFO:".blue(), message);
        } else {
            eprintln!("INFO: {}", message);
        }
    }

    /// Print configuration lines, one per line
    pub fn lines(&self, lines: &[PathLine]) -> Result<()> {
        if self.machine() {
            let rendered: Vec<String> = lines.iter().map(ToString::to_string).collect();
            return self.document(&rendered);
        }

        for line in lines {
            let text = line.to_string();
            if !self.use_color {
                println!("{}", text);
                continue;
            }
            match line.operation {
                Operation::Set => println!("{}", text.green()),
                Operation::Delete => println!("{}", text.red()),
            }
        }
        Ok(())
    }

    /// Print a prepared +/- diff
    pub fn diff(&self, diff: &str) {
        for line in diff.lines() {
            if !self.use_color {
                println!("{}", line);
            } else if line.starts_with('+') {
                println!("{}", line.green());
            } else if line.starts_with('-') {
                println!("{}", line.red());
            } else {
                println!("{}", line.dimmed());
            }
        }
    }

    /// Print a serializable document in the selected format
    ///
    /// Human mode uses YAML.
    pub fn document<T: Serialize>(&self, value: &T) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml | OutputFormat::Human => print!("{}", serde_yaml::to_string(value)?),
        }
        Ok(())
    }
}
