//! Ordered prefix dispatch tables.
//!
//! A [`FieldTable`] maps device sub-paths (`"link"`, `"family inet range"`)
//! to setters on a record. Patterns are tried longest first and only match on
//! a token boundary, so `forward-only` never claims a `forward-only-replies`
//! line.

use crate::error::{Error, Result};
use crate::line::{split_token, unquote};
use crate::merge::{upsert, Keyed};
use crate::record::ConfigRecord;
use std::cell::Cell;
use std::fmt::Display;
use std::str::FromStr;

type Setter<R> = Box<dyn Fn(&mut R, &Field<'_>) -> Result<()> + Send + Sync>;

struct Entry<R> {
    pattern: &'static str,
    set: Setter<R>,
}

/// Pattern to setter table for one record type.
pub struct FieldTable<R> {
    entries: Vec<Entry<R>>,
}

impl<R> Default for FieldTable<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R: 'static> std::fmt::Debug for FieldTable<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldTable")
            .field("patterns", &self.patterns())
            .finish()
    }
}

impl<R: 'static> FieldTable<R> {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a setter for lines starting with `pattern`.
    pub fn on<F>(mut self, pattern: &'static str, set: F) -> Self
    where
        F: Fn(&mut R, &Field<'_>) -> Result<()> + Send + Sync + 'static,
    {
        debug_assert!(
            self.entries.iter().all(|e| e.pattern != pattern),
            "duplicate pattern {pattern}"
        );
        self.entries.push(Entry {
            pattern,
            set: Box::new(set),
        });
        // Stable sort keeps registration order among equal lengths.
        self.entries
            .sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));
        self
    }

    /// Register a bare keyword that turns a flag on.
    pub fn flag(self, pattern: &'static str, set: fn(&mut R)) -> Self {
        self.on(pattern, move |record, _| {
            set(record);
            Ok(())
        })
    }

    /// Patterns in evaluation order.
    pub fn patterns(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.pattern).collect()
    }

    /// Dispatch one relative line into `record`.
    ///
    /// `line` is the verbatim device line, kept for error messages. Returns
    /// `Ok(false)` when no pattern claims the line (or a nested table does
    /// not know its tail).
    pub fn dispatch(&self, record: &mut R, relative: &str, line: &str) -> Result<bool> {
        let relative = relative.trim();
        for entry in &self.entries {
            let Some(rest) = match_pattern(relative, entry.pattern) else {
                continue;
            };
            let unmatched = Cell::new(false);
            let field = Field {
                rest,
                line,
                unmatched: &unmatched,
            };
            (entry.set)(record, &field)?;
            return Ok(!unmatched.get());
        }
        Ok(false)
    }
}

/// True when `text` starts with `path` on a token boundary.
pub(crate) fn under_path(text: &str, path: &str) -> bool {
    match_pattern(text.trim(), path).is_some()
}

/// Tail of `text` after `pattern`, if `pattern` matches on a token boundary.
fn match_pattern<'a>(text: &'a str, pattern: &str) -> Option<&'a str> {
    let tail = text.strip_prefix(pattern)?;
    if tail.is_empty() {
        Some(tail)
    } else if tail.starts_with(char::is_whitespace) {
        Some(tail.trim_start())
    } else {
        None
    }
}

/// The part of a line left after its pattern, with helpers to convert it.
pub struct Field<'a> {
    rest: &'a str,
    line: &'a str,
    unmatched: &'a Cell<bool>,
}

impl<'a> Field<'a> {
    /// Raw remainder after the pattern.
    pub fn rest(&self) -> &'a str {
        self.rest
    }

    /// The verbatim device line.
    pub fn line(&self) -> &'a str {
        self.line
    }

    /// Remainder as an unquoted string value.
    pub fn text(&self) -> Result<String> {
        if self.rest.is_empty() {
            return Err(Error::parse(self.line, "missing value"));
        }
        Ok(unquote(self.rest))
    }

    /// Remainder converted to a number or other `FromStr` type.
    ///
    /// Conversion failures name the offending line; nothing is coerced.
    pub fn number<T>(&self) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let text = self.text()?;
        text.parse::<T>()
            .map_err(|e| Error::parse(self.line, format!("invalid value '{}': {}", text, e)))
    }

    /// Dispatch the remainder into a nested record.
    pub fn descend<C: ConfigRecord>(&self, child: &mut C) -> Result<()> {
        if !C::field_table().dispatch(child, self.rest, self.line)? {
            self.unmatched.set(true);
        }
        Ok(())
    }

    /// Upsert the keyed sub-block named by the first token, then dispatch
    /// the rest of the line into it.
    pub fn upsert<C: ConfigRecord + Keyed>(&self, list: &mut Vec<C>) -> Result<()> {
        let (key_text, remainder) = split_token(self.rest)
            .ok_or_else(|| Error::parse(self.line, "missing block key"))?;
        let key = key_text.parse::<C::Key>().map_err(|_| {
            Error::parse(self.line, format!("invalid block key '{}'", key_text))
        })?;
        let entry = upsert(list, key);
        if !remainder.is_empty() && !C::field_table().dispatch(entry, remainder, self.line)? {
            self.unmatched.set(true);
        }
        Ok(())
    }

    /// Mark the line as not understood even though a pattern matched.
    pub fn reject(&self) {
        self.unmatched.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::LineWriter;
    use once_cell::sync::Lazy;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, PartialEq)]
    struct Relay {
        forward_only: bool,
        forward_only_replies: bool,
        hops: Option<u8>,
        servers: Vec<String>,
    }

    impl ConfigRecord for Relay {
        fn write_lines(&self, _w: &mut LineWriter) -> Result<()> {
            Ok(())
        }

        fn field_table() -> &'static FieldTable<Self> {
            static TABLE: Lazy<FieldTable<Relay>> = Lazy::new(|| {
                FieldTable::<Relay>::new()
                    .flag("forward-only", |r| r.forward_only = true)
                    .flag("forward-only-replies", |r| r.forward_only_replies = true)
                    .on("maximum-hop-count", |r, v| {
                        r.hops = Some(v.number()?);
                        Ok(())
                    })
                    .on("server", |r, v| {
                        r.servers.push(v.text()?);
                        Ok(())
                    })
            });
            &TABLE
        }
    }

    #[test]
    fn test_debug_lists_patterns() {
        let rendered = format!("{:?}", Relay::field_table());
        assert!(rendered.starts_with("FieldTable"));
        assert!(rendered.contains("forward-only-replies"));
    }

    #[test]
    fn test_under_path() {
        assert!(under_path("access address-assignment pool P1 link ae0", "access address-assignment pool"));
        assert!(under_path("forwarding-options dhcp-relay", "forwarding-options dhcp-relay"));
        assert!(!under_path("access-profile A", "access"));
    }

    #[test]
    fn test_longest_pattern_first() {
        let table = Relay::field_table();
        assert_eq!(table.patterns()[0], "forward-only-replies");
    }

    #[test]
    fn test_prefix_disambiguation() {
        let mut relay = Relay::default();
        assert!(Relay::field_table()
            .dispatch(&mut relay, "forward-only-replies", "forward-only-replies")
            .unwrap());
        assert!(relay.forward_only_replies);
        assert!(!relay.forward_only);

        assert!(Relay::field_table()
            .dispatch(&mut relay, "forward-only", "forward-only")
            .unwrap());
        assert!(relay.forward_only);
    }

    #[test]
    fn test_token_boundary() {
        let mut relay = Relay::default();
        assert!(!Relay::field_table()
            .dispatch(&mut relay, "servers 1.1.1.1", "servers 1.1.1.1")
            .unwrap());
        assert!(relay.servers.is_empty());
    }

    #[test]
    fn test_list_appends_in_order() {
        let mut relay = Relay::default();
        for line in ["server 10.0.0.2", "server 10.0.0.1"] {
            Relay::field_table().dispatch(&mut relay, line, line).unwrap();
        }
        assert_eq!(relay.servers, vec!["10.0.0.2", "10.0.0.1"]);
    }

    #[test]
    fn test_bad_number_reports_line() {
        let mut relay = Relay::default();
        let err = Relay::field_table()
            .dispatch(&mut relay, "maximum-hop-count many", "set maximum-hop-count many")
            .unwrap_err();
        match err {
            Error::Parse { line, .. } => assert_eq!(line, "set maximum-hop-count many"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_value() {
        let mut relay = Relay::default();
        assert!(Relay::field_table()
            .dispatch(&mut relay, "server", "server")
            .is_err());
    }

    #[test]
    fn test_match_pattern() {
        assert_eq!(match_pattern("link ae0", "link"), Some("ae0"));
        assert_eq!(match_pattern("link", "link"), Some(""));
        assert_eq!(match_pattern("links ae0", "link"), None);
    }
}
