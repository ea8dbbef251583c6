//! Parse command
//!
//! Reads `show configuration ... | display set [relative]` output into a
//! record and prints it.

use super::{read_input, with_kind, CommandContext};
use crate::cli::Kind;
use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use setconf::record::ConfigObject;
use std::path::PathBuf;

/// Arguments for the parse command
#[derive(Parser, Debug, Clone)]
pub struct ParseArgs {
    /// Object kind
    #[arg(long, short = 'k', value_enum)]
    pub kind: Kind,

    /// Device output (`-` for stdin)
    pub file: PathBuf,

    /// Absolute path prefix to strip when the output is not relative
    #[arg(long)]
    pub prefix: Option<String>,

    /// Composite identifier to stamp on the parsed record
    #[arg(long)]
    pub id: Option<String>,
}

impl ParseArgs {
    /// Execute the parse command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        with_kind!(self.kind, run_parse(self, ctx))
    }
}

fn run_parse<R: ConfigObject + Serialize>(args: &ParseArgs, ctx: &CommandContext) -> Result<i32> {
    let output = read_input(&args.file)?;

    let mut parser = ctx.parser();
    if let Some(prefix) = &args.prefix {
        parser = parser.with_strip_prefix(prefix)?;
    }
    let parsed = parser.parse::<R>(&output)?;
    ctx.report_unrecognized(&parsed.unrecognized);

    let mut record = parsed.record;
    if let Some(id) = &args.id {
        let identity = R::from_composite_id(id, &ctx.config.identity.separator)?;
        record.adopt_identity(&identity);
    }

    if !parsed.found {
        ctx.output
            .warning(&format!("no {} configuration found", R::KIND));
        ctx.output.document(&record)?;
        return Ok(1);
    }

    ctx.output.document(&record)?;
    Ok(0)
}
