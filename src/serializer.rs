//! Record to set-line serialization.
//!
//! [`serialize`] validates a record first and only then asks it to write its
//! lines through a [`LineWriter`], so a record that breaks a constraint never
//! produces partial output.

use crate::error::{Error, Result};
use crate::line::{path_tokens, PathLine};
use crate::merge::Keyed;
use crate::record::ConfigRecord;
use std::fmt::Display;

/// Validate `record` and render it under `prefix`.
pub fn serialize<R: ConfigRecord>(record: &R, prefix: &str) -> Result<Vec<PathLine>> {
    record.validate()?;
    let lines = render(record, prefix)?;
    tracing::debug!(prefix = %prefix.trim_end(), count = lines.len(), "serialized record");
    Ok(lines)
}

/// Render `record` under `prefix` without validating it.
///
/// For records read back from a device, which may legitimately break
/// constraints the device itself does not enforce.
pub fn render<R: ConfigRecord>(record: &R, prefix: &str) -> Result<Vec<PathLine>> {
    let mut writer = LineWriter::new(prefix)?;
    record.write_lines(&mut writer)?;
    Ok(writer.into_lines())
}

/// Accumulates set lines under a fixed path prefix.
#[derive(Debug, Clone)]
pub struct LineWriter {
    prefix: Vec<String>,
    lines: Vec<PathLine>,
}

impl LineWriter {
    /// Create a writer rooted at `prefix`.
    pub fn new(prefix: &str) -> Result<Self> {
        Ok(Self {
            prefix: path_tokens(prefix)?,
            lines: Vec::new(),
        })
    }

    fn child(&self, extra: Vec<String>) -> Self {
        let mut prefix = self.prefix.clone();
        prefix.extend(extra);
        Self {
            prefix,
            lines: Vec::new(),
        }
    }

    fn path(&self, suffix: &str) -> Vec<String> {
        let mut path = self.prefix.clone();
        path.extend(suffix.split_whitespace().map(String::from));
        path
    }

    /// The prefix tokens lines are written under.
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// Lines written so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Declare the prefix itself (`set <prefix>`).
    pub fn declare(&mut self) {
        self.lines.push(PathLine::set(self.prefix.clone(), None));
    }

    /// Bare keyword, written only when `on`.
    pub fn flag(&mut self, suffix: &str, on: bool) {
        if on {
            self.lines.push(PathLine::set(self.path(suffix), None));
        }
    }

    /// Scalar value, written only when present.
    pub fn value<V: Display>(&mut self, suffix: &str, value: Option<&V>) {
        if let Some(value) = value {
            self.lines
                .push(PathLine::set(self.path(suffix), Some(value.to_string())));
        }
    }

    /// Mandatory scalar value.
    pub fn text(&mut self, suffix: &str, value: &str) {
        self.lines
            .push(PathLine::set(self.path(suffix), Some(value.to_string())));
    }

    /// Ordered list: one line per element, in caller order.
    pub fn list<V: Display>(&mut self, suffix: &str, values: &[V]) {
        for value in values {
            self.lines
                .push(PathLine::set(self.path(suffix), Some(value.to_string())));
        }
    }

    /// Set-semantics list: sorted and de-duplicated for stable output.
    pub fn set_list<V: Display>(&mut self, suffix: &str, values: &[V]) {
        let mut rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
        rendered.sort();
        rendered.dedup();
        for value in rendered {
            self.lines.push(PathLine::set(self.path(suffix), Some(value)));
        }
    }

    /// Nested record under `suffix`.
    pub fn nested<C: ConfigRecord>(&mut self, suffix: &str, child: &C) -> Result<()> {
        let mut sub = self.child(suffix.split_whitespace().map(String::from).collect());
        child.write_lines(&mut sub)?;
        self.lines.append(&mut sub.lines);
        Ok(())
    }

    /// Repeated key-identified sub-blocks under `suffix KEY`.
    ///
    /// A child with no populated field still gets a bare `set ... suffix KEY`
    /// line so the entry exists on the device.
    pub fn blocks<C: ConfigRecord + Keyed>(&mut self, suffix: &str, children: &[C]) -> Result<()> {
        for child in children {
            let mut extra: Vec<String> = suffix.split_whitespace().map(String::from).collect();
            extra.push(child.key().to_string());
            let mut sub = self.child(extra);
            child.write_lines(&mut sub)?;
            if sub.is_empty() {
                sub.declare();
            }
            self.lines.append(&mut sub.lines);
        }
        Ok(())
    }

    /// Finish and return the lines in emission order.
    pub fn into_lines(self) -> Vec<PathLine> {
        self.lines
    }
}

// ============================================================================
// Cross-field constraints
// ============================================================================

/// Fail when both fields are set.
pub fn exclusive(field: &str, set: bool, other: &str, other_set: bool) -> Result<()> {
    if set && other_set {
        return Err(Error::validation(
            field,
            format!("cannot be combined with '{}'", other),
        ));
    }
    Ok(())
}

/// Fail when `field` is set without its companion.
pub fn required_with(field: &str, set: bool, companion: &str, companion_set: bool) -> Result<()> {
    if set && !companion_set {
        return Err(Error::validation(
            field,
            format!("requires '{}' to be set", companion),
        ));
    }
    Ok(())
}

/// Fail when a mandatory field is missing.
pub fn required(field: &str, set: bool) -> Result<()> {
    if !set {
        return Err(Error::validation(field, "is required"));
    }
    Ok(())
}

/// Fail when a field is set outside the variant it belongs to.
pub fn variant_only(field: &str, set: bool, variant: &str, in_variant: bool) -> Result<()> {
    if set && !in_variant {
        return Err(Error::validation(
            field,
            format!("is only valid with {}", variant),
        ));
    }
    Ok(())
}

/// Fail when a key-identified list carries the same key twice.
pub fn unique_keys<C: Keyed>(field: &str, children: &[C]) -> Result<()> {
    for (i, child) in children.iter().enumerate() {
        if children[..i].iter().any(|c| c.key() == child.key()) {
            return Err(Error::validation(
                field,
                format!("duplicate entry '{}'", child.key()),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FieldTable;
    use once_cell::sync::Lazy;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Leaf {
        name: String,
        size: Option<u32>,
    }

    impl Keyed for Leaf {
        type Key = String;
        fn key(&self) -> &String {
            &self.name
        }
        fn with_key(key: String) -> Self {
            Self {
                name: key,
                ..Default::default()
            }
        }
    }

    impl ConfigRecord for Leaf {
        fn write_lines(&self, w: &mut LineWriter) -> Result<()> {
            w.value("size", self.size.as_ref());
            Ok(())
        }

        fn field_table() -> &'static FieldTable<Self> {
            static TABLE: Lazy<FieldTable<Leaf>> = Lazy::new(FieldTable::new);
            &TABLE
        }
    }

    #[derive(Debug, Default)]
    struct Tree {
        enabled: bool,
        label: Option<String>,
        servers: Vec<String>,
        order: Vec<String>,
        leaves: Vec<Leaf>,
    }

    impl ConfigRecord for Tree {
        fn validate(&self) -> Result<()> {
            exclusive("enabled", self.enabled, "label", self.label.is_some())
        }

        fn write_lines(&self, w: &mut LineWriter) -> Result<()> {
            w.flag("enabled", self.enabled);
            w.value("label", self.label.as_ref());
            w.set_list("server", &self.servers);
            w.list("order", &self.order);
            w.blocks("leaf", &self.leaves)
        }

        fn field_table() -> &'static FieldTable<Self> {
            static TABLE: Lazy<FieldTable<Tree>> = Lazy::new(FieldTable::new);
            &TABLE
        }
    }

    fn texts(lines: &[PathLine]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_emission_order_and_shapes() {
        let tree = Tree {
            label: Some("core network".into()),
            servers: vec!["10.0.0.2".into(), "10.0.0.1".into(), "10.0.0.2".into()],
            order: vec!["b".into(), "a".into()],
            leaves: vec![
                Leaf { name: "L1".into(), size: Some(4) },
                Leaf { name: "L2".into(), size: None },
            ],
            ..Default::default()
        };
        let lines = serialize(&tree, "top node ").unwrap();
        assert_eq!(
            texts(&lines),
            vec![
                "set top node label \"core network\"",
                "set top node server 10.0.0.1",
                "set top node server 10.0.0.2",
                "set top node order b",
                "set top node order a",
                "set top node leaf L1 size 4",
                "set top node leaf L2",
            ]
        );
    }

    #[test]
    fn test_false_flag_and_unset_option_emit_nothing() {
        let lines = serialize(&Tree::default(), "top").unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_validation_precedes_output() {
        let tree = Tree {
            enabled: true,
            label: Some("x".into()),
            ..Default::default()
        };
        let err = serialize(&tree, "top").unwrap_err();
        match err {
            Error::Validation { field, .. } => assert_eq!(field, "enabled"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_render_skips_validation() {
        let tree = Tree {
            enabled: true,
            label: Some("x".into()),
            ..Default::default()
        };
        assert_eq!(render(&tree, "top").unwrap().len(), 2);
    }

    #[test]
    fn test_constraint_helpers() {
        assert!(exclusive("a", true, "b", false).is_ok());
        assert!(exclusive("a", true, "b", true).is_err());
        assert!(required_with("a", true, "b", false).is_err());
        assert!(required_with("a", false, "b", false).is_ok());
        assert!(required("a", false).is_err());
        assert!(variant_only("a", true, "family inet", false).is_err());
        assert!(variant_only("a", false, "family inet", false).is_ok());
    }

    #[test]
    fn test_unique_keys() {
        let dup = vec![Leaf::with_key("A".into()), Leaf::with_key("A".into())];
        assert!(unique_keys("leaf", &dup).is_err());
        assert!(unique_keys("leaf", &[Leaf::with_key("A".into())]).is_ok());
    }
}
