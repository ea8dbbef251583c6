//! Device output to record parsing.
//!
//! The device answers `show configuration <path> | display set relative`
//! with a framed block of `set` lines:
//!
//! ```text
//! <configuration-output>
//! set active-drain
//! set family inet range R1 low 10.0.0.1
//! </configuration-output>
//! ```
//!
//! [`ConfigParser`] strips the frame and the leading `set `, optionally an
//! absolute path prefix, and feeds every remaining line through the record's
//! [`FieldTable`]. Lines no pattern claims are skipped, so objects carrying
//! attributes this crate does not model can still be read.

mod table;

pub use table::{Field, FieldTable};

use table::under_path;

use crate::error::{Error, Result};
use crate::line::{path_tokens, quote, PathLine};
use crate::record::ConfigRecord;

/// Opening frame marker.
pub const OUTPUT_START: &str = "<configuration-output>";

/// Closing frame marker. Parsing stops here even mid-stream.
pub const OUTPUT_END: &str = "</configuration-output>";

/// Literal a session returns for a path with no configuration.
pub const EMPTY_CONFIG: &str = "empty";

/// Word every relative output line starts with.
const LINE_START: &str = "set ";

/// Result of parsing one object's output.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<R> {
    /// The reconstructed record; zero value when `found` is false
    pub record: R,
    /// Whether the output carried at least one line for the object itself,
    /// not counting lines of nested objects or outside the strip prefix
    pub found: bool,
    /// Lines no pattern understood (collected in strict mode only)
    pub unrecognized: Vec<String>,
}

/// Reads framed `display set` output into typed records.
#[derive(Debug, Clone, Default)]
pub struct ConfigParser {
    strip_prefix: Option<String>,
    strict: bool,
}

impl ConfigParser {
    /// Parser for output already relative to the object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove an absolute path prefix from every line before dispatch.
    ///
    /// Lines outside the prefix are treated as unrecognized.
    pub fn with_strip_prefix(mut self, prefix: &str) -> Result<Self> {
        let tokens = path_tokens(prefix)?;
        self.strip_prefix = if tokens.is_empty() {
            None
        } else {
            Some(tokens.iter().map(|t| quote(t)).collect::<Vec<_>>().join(" "))
        };
        Ok(self)
    }

    /// Collect unrecognized lines and log each one at warn level.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse raw device output.
    pub fn parse<R: ConfigRecord>(&self, output: &str) -> Result<Parsed<R>> {
        if output.is_empty() {
            return Err(Error::EmptyResponse(
                self.strip_prefix.clone().unwrap_or_default(),
            ));
        }
        if output.trim() == EMPTY_CONFIG {
            return Ok(Parsed {
                record: R::default(),
                found: false,
                unrecognized: Vec::new(),
            });
        }

        let table = R::field_table();
        let mut record = R::default();
        let mut found = false;
        let mut unrecognized = Vec::new();

        for raw in output.lines() {
            if raw.contains(OUTPUT_START) {
                continue;
            }
            if raw.contains(OUTPUT_END) {
                break;
            }
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let body = line.strip_prefix(LINE_START).unwrap_or(line);
            let relative = match &self.strip_prefix {
                Some(prefix) => match body.strip_prefix(prefix.as_str()) {
                    Some(rest) if rest.starts_with(' ') => rest.trim_start(),
                    _ => {
                        self.note_unrecognized(line, &mut unrecognized);
                        continue;
                    }
                },
                None => body,
            };
            if R::foreign_paths().iter().any(|p| under_path(relative, p)) {
                tracing::trace!(line, "skipping nested object line");
                continue;
            }
            found = true;

            if !table.dispatch(&mut record, relative, line)? {
                self.note_unrecognized(line, &mut unrecognized);
            }
        }

        tracing::debug!(
            found,
            unrecognized = unrecognized.len(),
            "parsed configuration output"
        );
        Ok(Parsed {
            record,
            found,
            unrecognized,
        })
    }

    /// Parse already-split lines, e.g. a serializer's output.
    pub fn parse_lines<R: ConfigRecord>(&self, lines: &[PathLine]) -> Result<Parsed<R>> {
        if lines.is_empty() {
            return self.parse(EMPTY_CONFIG);
        }
        let text = lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        self.parse(&text)
    }

    fn note_unrecognized(&self, line: &str, unrecognized: &mut Vec<String>) {
        if self.strict {
            tracing::warn!(line, "unrecognized configuration line");
            unrecognized.push(line.to_string());
        } else {
            tracing::debug!(line, "skipping unrecognized configuration line");
        }
    }
}

/// Parse relative output with default settings and return only the record.
pub fn parse_record<R: ConfigRecord>(output: &str) -> Result<R> {
    Ok(ConfigParser::new().parse::<R>(output)?.record)
}

/// Frame relative lines the way the device does.
pub fn frame_output(lines: &[String]) -> String {
    if lines.is_empty() {
        return EMPTY_CONFIG.to_string();
    }
    let mut out = String::from(OUTPUT_START);
    out.push('\n');
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(OUTPUT_END);
    out
}
