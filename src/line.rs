//! Hierarchical configuration lines.
//!
//! A [`PathLine`] is one `set` or `delete` command: an operation, an ordered
//! path of tokens and an optional value. Two lines are the same line when
//! they render to the same text.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Leading word of a set line.
pub const SET_WORD: &str = "set";

/// Leading word of a delete line.
pub const DELETE_WORD: &str = "delete";

/// Characters that force a token to be quoted.
static NEEDS_QUOTING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\s"';#{}\[\]]"#).expect("static regex"));

/// Operation carried by a configuration line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Create or overwrite the leaf
    Set,
    /// Remove the path and everything under it
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Set => write!(f, "{}", SET_WORD),
            Operation::Delete => write!(f, "{}", DELETE_WORD),
        }
    }
}

impl std::str::FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            SET_WORD => Ok(Operation::Set),
            DELETE_WORD => Ok(Operation::Delete),
            _ => Err(Error::parse(s, "expected 'set' or 'delete'")),
        }
    }
}

/// One hierarchical configuration command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathLine {
    /// Set or delete
    pub operation: Operation,
    /// Path tokens, unquoted
    pub path: Vec<String>,
    /// Leaf value, unquoted
    pub value: Option<String>,
    /// Whether the value is rendered inside quotes
    pub quoted: bool,
}

impl PathLine {
    /// Build a `set` line for a path and optional value.
    pub fn set(path: Vec<String>, value: Option<String>) -> Self {
        let quoted = value.as_deref().map_or(false, needs_quoting);
        Self {
            operation: Operation::Set,
            path,
            value,
            quoted,
        }
    }

    /// Build a `delete` line for a path.
    pub fn delete(path: Vec<String>) -> Self {
        Self {
            operation: Operation::Delete,
            path,
            value: None,
            quoted: false,
        }
    }

    /// Parse a rendered line back.
    ///
    /// The text form cannot tell a trailing value from a trailing path token,
    /// so every token after the operation lands in `path`.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text)?;
        let mut iter = tokens.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| Error::parse(text, "empty configuration line"))?;
        let operation = first
            .text
            .parse::<Operation>()
            .map_err(|_| Error::parse(text, "line must start with 'set' or 'delete'"))?;

        let mut quoted = false;
        let path: Vec<String> = iter
            .map(|t| {
                quoted |= t.quoted;
                t.text
            })
            .collect();
        if path.is_empty() {
            return Err(Error::parse(text, "line has no path"));
        }

        Ok(Self {
            operation,
            path,
            value: None,
            quoted,
        })
    }

    /// Every token after the operation, value included.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.path
            .iter()
            .map(String::as_str)
            .chain(self.value.as_deref())
    }

    /// True when `other` lies strictly below this line in the hierarchy.
    pub fn is_ancestor_of(&self, other: &PathLine) -> bool {
        let mine: Vec<&str> = self.tokens().collect();
        let theirs: Vec<&str> = other.tokens().collect();
        mine.len() < theirs.len() && theirs.starts_with(&mine)
    }

    /// The line with `prefix` tokens removed, if the line lies under it.
    pub fn strip_prefix(&self, prefix: &[String]) -> Option<String> {
        let tokens: Vec<&str> = self.tokens().collect();
        if tokens.len() <= prefix.len() || !tokens.iter().zip(prefix).all(|(a, b)| *a == b.as_str()) {
            return None;
        }
        Some(
            tokens[prefix.len()..]
                .iter()
                .map(|t| quote(t))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }
}

impl fmt::Display for PathLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation)?;
        for token in &self.path {
            write!(f, " {}", quote(token))?;
        }
        if let Some(value) = &self.value {
            write!(f, " {}", quote(value))?;
        }
        Ok(())
    }
}

impl PartialEq for PathLine {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for PathLine {}

impl Hash for PathLine {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

/// Split a path string such as `"access address-assignment pool P1 "` into tokens.
pub fn path_tokens(path: &str) -> Result<Vec<String>> {
    Ok(tokenize(path)?.into_iter().map(|t| t.text).collect())
}

/// True when a token must be wrapped in quotes to survive the device parser.
pub fn needs_quoting(token: &str) -> bool {
    token.is_empty() || NEEDS_QUOTING.is_match(token)
}

/// Render a raw token, quoting it when required.
pub fn quote(token: &str) -> String {
    if needs_quoting(token) {
        format!("\"{}\"", token.replace('"', "\\\""))
    } else {
        token.to_string()
    }
}

/// Strip one level of quoting from a token, if present.
pub fn unquote(token: &str) -> String {
    match token
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\\\"", "\""),
        None => token.to_string(),
    }
}

/// Split off the first token of a relative line.
///
/// Returns the unquoted token and the untouched remainder (leading spaces
/// trimmed), or `None` for an empty line.
pub fn split_token(text: &str) -> Option<(String, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    if text.starts_with('"') {
        let bytes = text.as_bytes();
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    let token = unquote(&text[..=i]);
                    return Some((token, text[i + 1..].trim_start()));
                }
                _ => i += 1,
            }
        }
        // Unterminated quote: take the rest verbatim.
        return Some((text[1..].to_string(), ""));
    }
    match text.find(char::is_whitespace) {
        Some(end) => Some((text[..end].to_string(), text[end..].trim_start())),
        None => Some((text.to_string(), "")),
    }
}

/// A token as found in a rendered line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    quoted: bool,
}

/// Tokenize a rendered line, honouring double quotes and `\"` escapes.
fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => match chars.next() {
                Some('"') => current.push('"'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(Token {
                        text: std::mem::take(&mut current),
                        quoted,
                    });
                    in_token = false;
                    quoted = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err(Error::parse(text, "unterminated quoted value"));
    }
    if in_token {
        tokens.push(Token {
            text: current,
            quoted,
        });
    }
    Ok(tokens)
}
