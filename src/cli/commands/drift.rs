//! Drift command
//!
//! Compares a desired record file against device output. Exits 0 when in
//! sync and 1 when the device differs.

use super::{is_machine, load_record, read_input, with_kind, CommandContext};
use crate::cli::Kind;
use anyhow::Result;
use clap::Parser;
use serde::de::DeserializeOwned;
use setconf::drift::detect;
use setconf::record::ConfigObject;
use std::path::PathBuf;

/// Arguments for the drift command
#[derive(Parser, Debug, Clone)]
pub struct DriftArgs {
    /// Object kind
    #[arg(long, short = 'k', value_enum)]
    pub kind: Kind,

    /// Desired record file (YAML or JSON)
    pub desired: PathBuf,

    /// Device output for the object (`-` for stdin)
    pub actual: PathBuf,

    /// Absolute path prefix to strip when the output is not relative
    #[arg(long)]
    pub prefix: Option<String>,

    /// Print the lines that would reconcile the device
    #[arg(long)]
    pub fix: bool,
}

impl DriftArgs {
    /// Execute the drift command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        with_kind!(self.kind, run_drift(self, ctx))
    }
}

fn run_drift<R: ConfigObject + DeserializeOwned>(
    args: &DriftArgs,
    ctx: &CommandContext,
) -> Result<i32> {
    let desired: R = load_record(&args.desired)?;
    let output = read_input(&args.actual)?;

    let mut parser = ctx.parser();
    if let Some(prefix) = &args.prefix {
        parser = parser.with_strip_prefix(prefix)?;
    }
    let parsed = parser.parse::<R>(&output)?;
    ctx.report_unrecognized(&parsed.unrecognized);

    let mut actual = parsed.record;
    actual.adopt_identity(&desired);
    let current = parsed.found.then_some(&actual);

    let report = detect(&desired, current, &desired.path_prefix())?;
    let fix = report.reconcile_lines();

    if is_machine(ctx.output.format()) {
        let doc = serde_json::json!({
            "in_sync": report.in_sync(),
            "missing": report.missing.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "unexpected": report.unexpected.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "additions": report.additions,
            "deletions": report.deletions,
            "fix": fix.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });
        ctx.output.document(&doc)?;
    } else if report.in_sync() {
        ctx.output.info(&format!("{} is in sync", R::KIND));
    } else {
        ctx.output.diff(&report.diff);
        if args.fix {
            println!();
            ctx.output.lines(&fix)?;
        }
    }

    Ok(if report.in_sync() { 0 } else { 1 })
}
