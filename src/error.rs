//! Error types for Setconf.
//!
//! Errors are grouped by the phase of a configuration transaction that
//! produced them, so callers can tell a change the device rejected apart from
//! a change that was applied but never became visible.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Setconf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Setconf.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Failed to reach or authenticate to the device.
    #[error("Failed to connect to '{host}': {message}")]
    ConnectionFailed {
        /// Target device
        host: String,
        /// Error message
        message: String,
    },

    /// The exclusive configuration lock could not be taken.
    #[error("Failed to lock configuration: {0}")]
    LockFailed(String),

    /// Session-level I/O failure outside of a specific phase.
    #[error("Session error: {0}")]
    Session(String),

    // ========================================================================
    // Transaction Errors
    // ========================================================================
    /// A record violates a cross-field constraint.
    #[error("Invalid value for '{field}': {message}")]
    Validation {
        /// Offending field, in device path form
        field: String,
        /// Error message
        message: String,
    },

    /// The device rejected a submitted configuration line.
    #[error("Device rejected '{line}': {message}")]
    ApplyFailed {
        /// The rejected line, or the batch summary when unknown
        line: String,
        /// Error message
        message: String,
    },

    /// The commit was refused.
    #[error("Commit failed: {message}")]
    CommitFailed {
        /// Error message
        message: String,
        /// Advisory warnings the device returned with the failure
        warnings: Vec<String>,
    },

    /// The commit succeeded but the object is absent on re-read.
    #[error("Post-commit verification failed: '{0}' not found after commit")]
    VerificationFailed(String),

    /// Object already exists on the device.
    #[error("'{0}' already exists")]
    AlreadyExists(String),

    /// Object does not exist on the device.
    #[error("'{0}' does not exist")]
    NotFound(String),

    // ========================================================================
    // Parse Errors
    // ========================================================================
    /// Malformed device output.
    #[error("Failed to parse line '{line}': {message}")]
    Parse {
        /// The offending line, verbatim
        line: String,
        /// Error message
        message: String,
    },

    /// The device answered a read with zero bytes.
    #[error("Device returned no output for '{0}'")]
    EmptyResponse(String),

    /// Composite identifier could not be built or split.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new parse error for a verbatim device line.
    pub fn parse(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Creates a new apply error.
    pub fn apply_failed(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApplyFailed {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Creates a new connection failed error.
    pub fn connection_failed(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Returns true if the device configuration is guaranteed untouched.
    ///
    /// Everything except a post-commit verification failure leaves the
    /// active configuration as it was before the transaction.
    pub fn is_rollback_safe(&self) -> bool {
        !matches!(self, Error::VerificationFailed(_))
    }

    /// Returns true if the error was raised before any line reached the device.
    pub fn is_pre_apply(&self) -> bool {
        matches!(
            self,
            Error::ConnectionFailed { .. }
                | Error::LockFailed(_)
                | Error::Validation { .. }
                | Error::AlreadyExists(_)
                | Error::NotFound(_)
                | Error::InvalidIdentifier(_)
        )
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation { .. } | Error::InvalidIdentifier(_) => 2,
            Error::ConnectionFailed { .. } | Error::LockFailed(_) | Error::Session(_) => 3,
            Error::ApplyFailed { .. } | Error::CommitFailed { .. } => 4,
            Error::VerificationFailed(_) => 5,
            Error::Parse { .. } | Error::EmptyResponse(_) => 6,
            _ => 1,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}
