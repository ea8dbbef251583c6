//! Render command
//!
//! Turns a record file into the set lines a create (or, with `--replace`, an
//! update) would submit.

use super::{load_record, with_kind, CommandContext};
use crate::cli::Kind;
use anyhow::Result;
use clap::Parser;
use serde::de::DeserializeOwned;
use setconf::record::ConfigObject;
use setconf::serializer::serialize;
use std::path::PathBuf;

/// Arguments for the render command
#[derive(Parser, Debug, Clone)]
pub struct RenderArgs {
    /// Object kind
    #[arg(long, short = 'k', value_enum)]
    pub kind: Kind,

    /// Record file (YAML or JSON, `-` for stdin)
    pub file: PathBuf,

    /// Render under this prefix instead of the object's own path
    #[arg(long)]
    pub prefix: Option<String>,

    /// Start with the delete lines an update sends
    #[arg(long)]
    pub replace: bool,
}

impl RenderArgs {
    /// Execute the render command
    pub fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        with_kind!(self.kind, run_render(self, ctx))
    }
}

fn run_render<R: ConfigObject + DeserializeOwned>(
    args: &RenderArgs,
    ctx: &CommandContext,
) -> Result<i32> {
    let record: R = load_record(&args.file)?;
    let prefix = args
        .prefix
        .clone()
        .unwrap_or_else(|| record.path_prefix());

    let mut lines = Vec::new();
    if args.replace {
        lines.extend(record.clear_lines(&prefix)?);
    }
    lines.extend(serialize(&record, &prefix)?);

    ctx.output.info(&format!(
        "{} {}: {} lines",
        R::KIND,
        record.composite_id(&ctx.config.identity.separator)?,
        lines.len()
    ));
    ctx.output.lines(&lines)?;
    Ok(0)
}
