//! Desired versus actual configuration.
//!
//! Both records are serialized under the same prefix and compared line by
//! line, so drift is reported in the device's own dialect.

use crate::error::Result;
use crate::line::PathLine;
use crate::record::ConfigRecord;
use crate::serializer::{render as render_record, serialize};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::collections::HashSet;

/// Differences between a desired and an actual record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    /// Lines the device lacks
    pub missing: Vec<PathLine>,
    /// Lines the device has but the desired record does not
    pub unexpected: Vec<PathLine>,
    /// Unified-style diff of the rendered lines, actual to desired
    pub diff: String,
    pub additions: usize,
    pub deletions: usize,
}

impl DriftReport {
    /// True when nothing differs.
    pub fn in_sync(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }

    /// Lines that bring the device to the desired state: deletes first.
    pub fn reconcile_lines(&self) -> Vec<PathLine> {
        self.unexpected
            .iter()
            .map(|line| PathLine::delete(line.tokens().map(String::from).collect()))
            .chain(self.missing.iter().cloned())
            .collect()
    }
}

/// Compare `desired` against `actual` under `prefix`.
///
/// Only `desired` is validated. `None` means the object is absent on the
/// device, so every desired line is missing.
pub fn detect<R: ConfigRecord>(desired: &R, actual: Option<&R>, prefix: &str) -> Result<DriftReport> {
    let want = serialize(desired, prefix)?;
    let have = match actual {
        Some(actual) => render_record(actual, prefix)?,
        None => Vec::new(),
    };

    let want_set: HashSet<&PathLine> = want.iter().collect();
    let have_set: HashSet<&PathLine> = have.iter().collect();

    let missing: Vec<PathLine> = want
        .iter()
        .filter(|l| !have_set.contains(l))
        .cloned()
        .collect();
    let unexpected: Vec<PathLine> = have
        .iter()
        .filter(|l| !want_set.contains(l))
        .cloned()
        .collect();

    let before = render(&have);
    let after = render(&want);
    let text_diff = TextDiff::from_lines(&before, &after);

    let mut diff = String::new();
    let mut additions = 0;
    let mut deletions = 0;
    for change in text_diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => {
                deletions += 1;
                "-"
            }
            ChangeTag::Insert => {
                additions += 1;
                "+"
            }
            ChangeTag::Equal => " ",
        };
        diff.push_str(&format!("{}{}", sign, change));
    }

    tracing::debug!(
        missing = missing.len(),
        unexpected = unexpected.len(),
        "drift detection complete"
    );

    Ok(DriftReport {
        missing,
        unexpected,
        diff,
        additions,
        deletions,
    })
}

fn render(lines: &[PathLine]) -> String {
    lines.iter().map(|l| format!("{}\n", l)).collect()
}
