//! Configuration module for Setconf
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/setconf/setconf.toml)
//! - User configuration (~/.setconf.toml)
//! - Project configuration (./setconf.toml)
//! - Environment variables

use crate::identity::DEFAULT_SEPARATOR;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Commit comment used when none is configured.
///
/// `{action}`, `{kind}` and `{id}` are replaced per transaction.
pub const DEFAULT_COMMIT_COMMENT: &str = "setconf {action} {kind} {id}";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transaction settings
    pub transaction: TransactionConfig,

    /// Parser settings
    pub parser: ParserConfig,

    /// Composite identifier settings
    pub identity: IdentityConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Transaction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Commit comment template
    pub commit_comment: String,

    /// Re-read created and updated objects after commit
    pub verify_after_commit: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            commit_comment: DEFAULT_COMMIT_COMMENT.to_string(),
            verify_after_commit: true,
        }
    }
}

/// Parser settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Report unrecognized lines as warnings
    pub strict: bool,
}

/// Composite identifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Separator between identifier components
    pub separator: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no -v flag or RUST_LOG is given
    pub level: String,

    /// Emit JSON log lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading configuration file");
                config = config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides();
        config.check()?;

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Explicit path takes priority
        if let Some(path) = explicit_path {
            paths.push(path.clone());
            return paths;
        }

        if let Ok(env_config) = std::env::var("SETCONF_CONFIG") {
            paths.push(PathBuf::from(env_config));
            return paths;
        }

        paths.push(PathBuf::from("/etc/setconf/setconf.toml"));

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".setconf.toml"));
        }

        paths.push(PathBuf::from("setconf.toml"));

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: ConfigLayer = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Overlay the keys a file sets onto this config
    fn merge(&self, layer: ConfigLayer) -> Config {
        let mut merged = self.clone();

        if let Some(comment) = layer.transaction.commit_comment {
            merged.transaction.commit_comment = comment;
        }
        if let Some(verify) = layer.transaction.verify_after_commit {
            merged.transaction.verify_after_commit = verify;
        }
        if let Some(strict) = layer.parser.strict {
            merged.parser.strict = strict;
        }
        if let Some(separator) = layer.identity.separator {
            merged.identity.separator = separator;
        }
        if let Some(level) = layer.logging.level {
            merged.logging.level = level;
        }
        if let Some(json) = layer.logging.json {
            merged.logging.json = json;
        }

        merged
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // SETCONF_COMMIT_COMMENT
        if let Ok(comment) = std::env::var("SETCONF_COMMIT_COMMENT") {
            self.transaction.commit_comment = comment;
        }

        // SETCONF_VERIFY
        if let Ok(verify) = std::env::var("SETCONF_VERIFY") {
            if let Some(on) = parse_bool(&verify) {
                self.transaction.verify_after_commit = on;
            }
        }

        // SETCONF_STRICT
        if let Ok(strict) = std::env::var("SETCONF_STRICT") {
            if let Some(on) = parse_bool(&strict) {
                self.parser.strict = on;
            }
        }

        // SETCONF_ID_SEPARATOR
        if let Ok(separator) = std::env::var("SETCONF_ID_SEPARATOR") {
            self.identity.separator = separator;
        }

        // SETCONF_LOG_LEVEL
        if let Ok(level) = std::env::var("SETCONF_LOG_LEVEL") {
            self.logging.level = level;
        }

        // SETCONF_LOG_JSON
        if let Ok(json) = std::env::var("SETCONF_LOG_JSON") {
            if let Some(on) = parse_bool(&json) {
                self.logging.json = on;
            }
        }
    }

    /// Reject settings the engine cannot work with
    fn check(&self) -> Result<()> {
        if self.identity.separator.is_empty() {
            anyhow::bail!("identity.separator must not be empty");
        }
        if self.identity.separator.contains(char::is_whitespace) {
            anyhow::bail!(
                "identity.separator must not contain whitespace: {:?}",
                self.identity.separator
            );
        }
        Ok(())
    }

    /// Load from a specific file only, skipping the standard locations
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::default().merge_from_file(path.as_ref())?;
        config.check()?;
        Ok(config)
    }
}

/// One configuration file as written; unset keys leave earlier layers alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    transaction: TransactionLayer,
    parser: ParserLayer,
    identity: IdentityLayer,
    logging: LoggingLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TransactionLayer {
    commit_comment: Option<String>,
    verify_after_commit: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ParserLayer {
    strict: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IdentityLayer {
    separator: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingLayer {
    level: Option<String>,
    json: Option<bool>,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.identity.separator, "_-_");
        assert!(config.transaction.verify_after_commit);
        assert!(!config.parser.strict);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_config_merge() {
        let base = Config::default();
        let layer: ConfigLayer = toml::from_str("[parser]\nstrict = true\n[identity]\nseparator = \"::\"\n").unwrap();

        let merged = base.merge(layer);
        assert!(merged.parser.strict);
        assert_eq!(merged.identity.separator, "::");
        assert_eq!(merged.transaction.commit_comment, DEFAULT_COMMIT_COMMENT);
        assert!(merged.transaction.verify_after_commit);
    }

    #[test]
    fn test_later_layer_can_restore_defaults() {
        let system: ConfigLayer = toml::from_str(
            "[transaction]\nverify_after_commit = false\ncommit_comment = \"CHG {id}\"\n\
             [parser]\nstrict = true\n[logging]\njson = true\nlevel = \"debug\"\n",
        )
        .unwrap();
        let project: ConfigLayer = toml::from_str(
            "[transaction]\nverify_after_commit = true\ncommit_comment = \"setconf {action} {kind} {id}\"\n\
             [parser]\nstrict = false\n[logging]\njson = false\nlevel = \"warn\"\n",
        )
        .unwrap();

        let merged = Config::default().merge(system).merge(project);
        assert_eq!(merged, Config::default());
    }

    #[test]
    fn test_unset_keys_keep_earlier_layer() {
        let system: ConfigLayer = toml::from_str("[parser]\nstrict = true\n").unwrap();
        let project: ConfigLayer = toml::from_str("[logging]\nlevel = \"info\"\n").unwrap();

        let merged = Config::default().merge(system).merge(project);
        assert!(merged.parser.strict);
        assert_eq!(merged.logging.level, "info");
    }

    #[test]
    #[serial]
    fn test_env_override() {
        std::env::set_var("SETCONF_STRICT", "yes");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert!(config.parser.strict);
        std::env::remove_var("SETCONF_STRICT");
    }

    #[test]
    fn test_empty_separator_rejected() {
        let config = Config {
            identity: IdentityConfig {
                separator: String::new(),
            },
            ..Config::default()
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("On"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
