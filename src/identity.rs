//! Composite object identifiers.
//!
//! Objects identified by several components (name, routing instance,
//! version) expose a single string id with the components joined by a
//! reserved separator. Components are rejected when they contain the
//! separator or when the joined id would split differently.

use crate::error::{Error, Result};
use std::fmt;

/// Separator used when no other is configured.
pub const DEFAULT_SEPARATOR: &str = "_-_";

/// Routing context of objects that live at the configuration root.
pub const DEFAULT_ROUTING_INSTANCE: &str = "default";

/// An identifier built from ordered components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeId {
    components: Vec<String>,
    separator: String,
}

impl CompositeId {
    /// Build an identifier, rejecting components that contain the separator or
    /// that would run into it when joined.
    pub fn new(components: Vec<String>, separator: &str) -> Result<Self> {
        if separator.is_empty() {
            return Err(Error::InvalidIdentifier(
                "separator must not be empty".to_string(),
            ));
        }
        if components.is_empty() {
            return Err(Error::InvalidIdentifier(
                "identifier needs at least one component".to_string(),
            ));
        }
        if let Some(bad) = components.iter().find(|c| c.contains(separator)) {
            return Err(Error::InvalidIdentifier(format!(
                "component '{}' contains reserved separator '{}'",
                bad, separator
            )));
        }
        let joined = components.join(separator);
        if !joined.split(separator).eq(components.iter().map(String::as_str)) {
            return Err(Error::InvalidIdentifier(format!(
                "components {:?} do not split back from '{}'",
                components, joined
            )));
        }
        Ok(Self {
            components,
            separator: separator.to_string(),
        })
    }

    /// Split a joined identifier.
    pub fn parse(id: &str, separator: &str) -> Result<Self> {
        if id.is_empty() {
            return Err(Error::InvalidIdentifier("empty identifier".to_string()));
        }
        if separator.is_empty() {
            return Err(Error::InvalidIdentifier(
                "separator must not be empty".to_string(),
            ));
        }
        Ok(Self {
            components: id.split(separator).map(String::from).collect(),
            separator: separator.to_string(),
        })
    }

    /// The components in order.
    pub fn components(&self) -> &[String] {
        &self.components
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join(&self.separator))
    }
}

/// Check that an identifier carries exactly `expected` components.
pub fn expect_components<'a>(
    kind: &str,
    parts: &'a [String],
    expected: usize,
) -> Result<&'a [String]> {
    if parts.len() != expected {
        return Err(Error::InvalidIdentifier(format!(
            "{} identifier needs {} components, got {}",
            kind,
            expected,
            parts.len()
        )));
    }
    if parts[0].is_empty() {
        return Err(Error::InvalidIdentifier(format!(
            "{} identifier has an empty name",
            kind
        )));
    }
    Ok(parts)
}

/// Path prefix for an object that may live inside a routing instance.
pub fn routing_context_prefix(routing_instance: &str, path: &str) -> String {
    if routing_instance.is_empty() || routing_instance == DEFAULT_ROUTING_INSTANCE {
        path.to_string()
    } else {
        format!(
            "routing-instances {} {}",
            crate::line::quote(routing_instance),
            path
        )
    }
}

/// Normalize an empty routing instance to the default one.
pub fn routing_instance_or_default(routing_instance: &str) -> String {
    if routing_instance.is_empty() {
        DEFAULT_ROUTING_INSTANCE.to_string()
    } else {
        routing_instance.to_string()
    }
}
