//! Device sessions.
//!
//! A [`SessionHandle`] is one authenticated connection to a device that can
//! run show commands and drive the candidate configuration: lock it, load a
//! batch of lines, commit or discard, unlock. How bytes reach the device is
//! up to the implementation; a [`Connector`] opens new handles on demand.
//!
//! [`MemoryDevice`] is a self-contained implementation that keeps
//! configuration in memory, used for offline runs and tests.

mod memory;

pub use memory::{Faults, MemoryDevice, MemorySession};

use crate::error::Result;
use crate::line::PathLine;
use serde::{Deserialize, Serialize};

/// Outcome of a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitOutcome {
    /// Advisory warnings the device printed while committing
    pub warnings: Vec<String>,
}

impl CommitOutcome {
    /// Commit with no warnings.
    pub fn clean() -> Self {
        Self::default()
    }

    /// Commit that produced warnings.
    pub fn with_warnings(warnings: Vec<String>) -> Self {
        Self { warnings }
    }
}

/// One logical connection to a device.
///
/// Calls are blocking. Implementations return `Error::LockFailed` from
/// [`config_lock`](SessionHandle::config_lock), `Error::ApplyFailed` from
/// [`config_set`](SessionHandle::config_set) and `Error::CommitFailed` from
/// [`commit_conf`](SessionHandle::commit_conf); any other failure surfaces as
/// `Error::Session`.
pub trait SessionHandle: Send {
    /// Run an operational command and return its raw output.
    ///
    /// A show command for a path without configuration returns
    /// [`EMPTY_CONFIG`](crate::parser::EMPTY_CONFIG), never an empty string.
    fn command(&mut self, command: &str) -> Result<String>;

    /// Load a batch of lines into the candidate configuration, in order.
    fn config_set(&mut self, lines: &[PathLine]) -> Result<()>;

    /// Commit the candidate configuration with an audit comment.
    fn commit_conf(&mut self, comment: &str) -> Result<CommitOutcome>;

    /// Take the exclusive configuration lock.
    fn config_lock(&mut self) -> Result<()>;

    /// Release the configuration lock.
    fn config_unlock(&mut self) -> Result<()>;

    /// Discard uncommitted candidate changes.
    fn config_clear(&mut self) -> Result<()>;

    /// Close the session.
    fn close(&mut self) -> Result<()>;
}

/// Opens sessions to one device.
pub trait Connector: Send + Sync {
    /// Device name used in logs and errors.
    fn target(&self) -> &str;

    /// Establish a new session. Failure means no lock was taken.
    fn connect(&self) -> Result<Box<dyn SessionHandle>>;
}

/// Show command returning `path`'s configuration as relative set lines.
pub fn show_config_command(path: &str) -> String {
    format!("show configuration {} | display set relative", path.trim())
}
