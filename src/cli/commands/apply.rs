//! Apply command
//!
//! Runs a full transaction against an in-memory device seeded from a
//! snapshot of absolute set lines. With `--write` the committed
//! configuration is written back to the snapshot.

use super::{is_machine, load_record, read_input, with_kind, CommandContext};
use crate::cli::Kind;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::de::DeserializeOwned;
use setconf::record::ConfigObject;
use setconf::session::MemoryDevice;
use setconf::transaction::{TransactionCoordinator, TxSettings};
use std::path::PathBuf;

/// Transaction to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApplyAction {
    /// Create a new object
    Create,
    /// Replace an existing object
    Update,
    /// Remove an existing object
    Delete,
}

/// Arguments for the apply command
#[derive(Parser, Debug, Clone)]
pub struct ApplyArgs {
    /// Object kind
    #[arg(long, short = 'k', value_enum)]
    pub kind: Kind,

    /// Transaction to run
    #[arg(long, short = 'a', value_enum, default_value = "create")]
    pub action: ApplyAction,

    /// Record file (YAML or JSON)
    pub record: PathBuf,

    /// Device snapshot: absolute set lines, one per line
    #[arg(long, short = 'd')]
    pub device: PathBuf,

    /// Write the committed configuration back to the snapshot
    #[arg(long)]
    pub write: bool,
}

impl ApplyArgs {
    /// Execute the apply command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        with_kind!(self.kind, run_apply(self, ctx))
    }
}

fn run_apply<R: ConfigObject + DeserializeOwned>(
    args: &ApplyArgs,
    ctx: &CommandContext,
) -> Result<i32> {
    let record: R = load_record(&args.record)?;
    let snapshot = read_input(&args.device)?;
    let device = MemoryDevice::with_config(args.device.display().to_string(), &snapshot)?;

    let tx = TransactionCoordinator::new(device.clone())
        .with_settings(TxSettings::from_config(&ctx.config));
    let outcome = match args.action {
        ApplyAction::Create => tx.create(&record)?,
        ApplyAction::Update => tx.update(&record)?,
        ApplyAction::Delete => tx.delete(&record)?,
    };

    for warning in &outcome.warnings {
        ctx.output.warning(warning);
    }
    ctx.output
        .info(&format!("committed {} lines", outcome.lines_applied));

    let active = device.active_config();
    if args.write {
        let mut content = active.join("\n");
        content.push('\n');
        std::fs::write(&args.device, content)
            .with_context(|| format!("Failed to write {}", args.device.display()))?;
    }

    if is_machine(ctx.output.format()) {
        ctx.output.document(&serde_json::json!({
            "lines_applied": outcome.lines_applied,
            "warnings": outcome.warnings,
            "configuration": active,
        }))?;
    } else {
        for line in &active {
            println!("{}", line);
        }
    }
    Ok(0)
}
