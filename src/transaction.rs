//! Lock, apply, commit, verify.
//!
//! A [`TransactionCoordinator`] runs one object change against one device:
//!
//! ```text
//! Unconnected -> Connected -> Locked -> Applying -> Committed -> Unlocked -> Closed
//!                                          \-> RolledBack --/
//! ```
//!
//! Every operation holds the coordinator's [`DeviceLock`] from connect to
//! close, so the existence check and the write that depends on it observe the
//! same device state. Cleanup lives in [`TransactionGuard`]'s `Drop`: pending
//! changes are discarded, the configuration lock is released and the session
//! is closed on every exit path, including early returns and panics.

use crate::config::{Config, DEFAULT_COMMIT_COMMENT};
use crate::error::{Error, Result};
use crate::identity::DEFAULT_SEPARATOR;
use crate::line::{path_tokens, PathLine};
use crate::parser::ConfigParser;
use crate::record::ConfigObject;
use crate::serializer::serialize;
use crate::session::{show_config_command, CommitOutcome, Connector, SessionHandle};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, info_span, warn};

// ============================================================================
// Device Lock
// ============================================================================

/// In-process mutex serializing operations against one device.
///
/// Share one instance (behind an `Arc`) between every coordinator that
/// targets the same device.
#[derive(Debug, Default)]
pub struct DeviceLock {
    inner: Mutex<()>,
}

impl DeviceLock {
    /// New, unheld lock.
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock()
    }

    /// True while an operation is in progress.
    pub fn is_held(&self) -> bool {
        self.inner.is_locked()
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Per-coordinator behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSettings {
    /// Commit comment template with `{action}`, `{kind}` and `{id}` placeholders
    pub commit_comment: String,
    /// Re-read created and updated objects after commit
    pub verify_after_commit: bool,
    /// Report unrecognized lines on reads
    pub strict: bool,
    /// Composite identifier separator
    pub separator: String,
}

impl Default for TxSettings {
    fn default() -> Self {
        Self {
            commit_comment: DEFAULT_COMMIT_COMMENT.to_string(),
            verify_after_commit: true,
            strict: false,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl TxSettings {
    /// Default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings taken from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            commit_comment: config.transaction.commit_comment.clone(),
            verify_after_commit: config.transaction.verify_after_commit,
            strict: config.parser.strict,
            separator: config.identity.separator.clone(),
        }
    }

    /// Set the commit comment template
    pub fn with_comment(mut self, template: impl Into<String>) -> Self {
        self.commit_comment = template.into();
        self
    }

    /// Skip the post-commit re-read
    pub fn without_verification(mut self) -> Self {
        self.verify_after_commit = false;
        self
    }

    /// Enable strict parsing
    pub fn with_strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Set the identifier separator
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    fn comment(&self, action: Action, kind: &str, id: &str) -> String {
        self.commit_comment
            .replace("{action}", &action.to_string())
            .replace("{kind}", kind)
            .replace("{id}", id)
    }
}

// ============================================================================
// States and outcomes
// ============================================================================

/// Transaction states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TxState {
    Unconnected,
    Connected,
    Locked,
    Applying,
    Committed,
    RolledBack,
    Unlocked,
    Closed,
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxState::Unconnected => "unconnected",
            TxState::Connected => "connected",
            TxState::Locked => "locked",
            TxState::Applying => "applying",
            TxState::Committed => "committed",
            TxState::RolledBack => "rolled-back",
            TxState::Unlocked => "unlocked",
            TxState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// Kind of write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// Result of a committed write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutcome {
    /// Advisory commit warnings
    pub warnings: Vec<String>,
    /// Number of lines submitted in the batch
    pub lines_applied: usize,
}

// ============================================================================
// Guard
// ============================================================================

/// Owns one session for the duration of an operation.
pub struct TransactionGuard {
    session: Box<dyn SessionHandle>,
    target: String,
    state: TxState,
    locked: bool,
}

impl TransactionGuard {
    /// Connect through `connector`.
    pub fn open(connector: &dyn Connector) -> Result<Self> {
        let session = connector.connect()?;
        info!(target_device = connector.target(), "session connected");
        Ok(Self {
            session,
            target: connector.target().to_string(),
            state: TxState::Connected,
            locked: false,
        })
    }

    /// Current state.
    pub fn state(&self) -> TxState {
        self.state
    }

    fn transition(&mut self, next: TxState) {
        tracing::debug!(from = %self.state, to = %next, "transaction state");
        self.state = next;
    }

    /// Take the device configuration lock.
    pub fn lock(&mut self) -> Result<()> {
        self.session.config_lock()?;
        self.locked = true;
        self.transition(TxState::Locked);
        Ok(())
    }

    /// Read the object named by `identity`; `None` when it has no configuration.
    pub fn read<R: ConfigObject>(&mut self, identity: &R, parser: &ConfigParser) -> Result<Option<R>> {
        let path = identity.path_prefix();
        let output = self.session.command(&show_config_command(&path))?;
        if output.is_empty() {
            return Err(Error::EmptyResponse(path));
        }
        let parsed = parser.parse::<R>(&output)?;
        if !parsed.found {
            return Ok(None);
        }
        let mut record = parsed.record;
        record.adopt_identity(identity);
        Ok(Some(record))
    }

    /// Submit a batch; on failure the candidate is discarded before returning.
    pub fn apply(&mut self, lines: &[PathLine]) -> Result<()> {
        self.transition(TxState::Applying);
        if let Err(e) = self.session.config_set(lines) {
            warn!(error = %e, "device rejected configuration batch");
            self.rollback();
            return Err(e);
        }
        Ok(())
    }

    /// Commit; on failure the candidate is discarded before returning.
    pub fn commit(&mut self, comment: &str) -> Result<CommitOutcome> {
        match self.session.commit_conf(comment) {
            Ok(outcome) => {
                for warning in &outcome.warnings {
                    warn!(warning = %warning, "commit warning");
                }
                self.transition(TxState::Committed);
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "commit failed");
                self.rollback();
                Err(e)
            }
        }
    }

    /// Discard uncommitted changes. Failures are logged, not returned.
    pub fn rollback(&mut self) {
        if let Err(e) = self.session.config_clear() {
            warn!(target_device = %self.target, error = %e, "failed to discard candidate configuration");
        }
        self.transition(TxState::RolledBack);
        info!(target_device = %self.target, "changes rolled back");
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if matches!(self.state, TxState::Locked | TxState::Applying) {
            self.rollback();
        }
        if self.locked {
            if let Err(e) = self.session.config_unlock() {
                warn!(target_device = %self.target, error = %e, "failed to release configuration lock");
            }
            self.locked = false;
            self.transition(TxState::Unlocked);
        }
        if let Err(e) = self.session.close() {
            warn!(target_device = %self.target, error = %e, "failed to close session");
        }
        self.transition(TxState::Closed);
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Runs object reads and writes against one device.
pub struct TransactionCoordinator<C: Connector> {
    connector: C,
    lock: Arc<DeviceLock>,
    settings: TxSettings,
}

impl<C: Connector> TransactionCoordinator<C> {
    /// Coordinator with its own device lock and default settings.
    pub fn new(connector: C) -> Self {
        Self::with_lock(connector, Arc::new(DeviceLock::new()))
    }

    /// Coordinator sharing `lock` with others targeting the same device.
    pub fn with_lock(connector: C, lock: Arc<DeviceLock>) -> Self {
        Self {
            connector,
            lock,
            settings: TxSettings::default(),
        }
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: TxSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The device lock, for sharing.
    pub fn device_lock(&self) -> Arc<DeviceLock> {
        Arc::clone(&self.lock)
    }

    /// Active settings.
    pub fn settings(&self) -> &TxSettings {
        &self.settings
    }

    /// The connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn parser(&self) -> ConfigParser {
        ConfigParser::new().strict(self.settings.strict)
    }

    fn object_id<R: ConfigObject>(&self, record: &R) -> Result<String> {
        if !record.is_present() {
            return Err(Error::InvalidIdentifier(format!(
                "{} record has no name",
                R::KIND
            )));
        }
        Ok(record.composite_id(&self.settings.separator)?.to_string())
    }

    /// Read the object named by `identity`.
    pub fn read<R: ConfigObject>(&self, identity: &R) -> Result<Option<R>> {
        let id = self.object_id(identity)?;
        let span = info_span!("read", kind = R::KIND, id = %id);
        let _enter = span.enter();
        let _held = self.lock.acquire();

        let mut guard = TransactionGuard::open(&self.connector)?;
        guard.read(identity, &self.parser())
    }

    /// Read an object by composite identifier.
    pub fn read_by_id<R: ConfigObject>(&self, id: &str) -> Result<Option<R>> {
        let identity = R::from_composite_id(id, &self.settings.separator)?;
        self.read(&identity)
    }

    /// True if the object has any configuration on the device.
    pub fn exists<R: ConfigObject>(&self, identity: &R) -> Result<bool> {
        Ok(self.read(identity)?.is_some())
    }

    /// Create an object that must not exist yet.
    pub fn create<R: ConfigObject>(&self, desired: &R) -> Result<TxOutcome> {
        self.write(Action::Create, desired)
    }

    /// Replace an existing object's configuration.
    pub fn update<R: ConfigObject>(&self, desired: &R) -> Result<TxOutcome> {
        self.write(Action::Update, desired)
    }

    /// Remove an existing object.
    pub fn delete<R: ConfigObject>(&self, identity: &R) -> Result<TxOutcome> {
        self.write(Action::Delete, identity)
    }

    fn write<R: ConfigObject>(&self, action: Action, record: &R) -> Result<TxOutcome> {
        let id = self.object_id(record)?;
        let span = info_span!("transaction", action = %action, kind = R::KIND, id = %id);
        let _enter = span.enter();
        let _held = self.lock.acquire();

        let prefix = record.path_prefix();
        let body = match action {
            Action::Delete => Vec::new(),
            Action::Create | Action::Update => serialize(record, &prefix)?,
        };
        if action != Action::Delete && body.is_empty() {
            return Err(Error::validation(
                R::KIND,
                format!("{} has no configuration to write", id),
            ));
        }

        let mut guard = TransactionGuard::open(&self.connector)?;
        guard.lock()?;

        let parser = self.parser();
        let existing = guard.read(record, &parser)?;
        match (action, existing.is_some()) {
            (Action::Create, true) => return Err(Error::AlreadyExists(id)),
            (Action::Update | Action::Delete, false) => return Err(Error::NotFound(id)),
            _ => {}
        }

        let lines = match action {
            Action::Create => body,
            Action::Update => {
                let mut lines = record.clear_lines(&prefix)?;
                lines.extend(body);
                lines
            }
            Action::Delete => vec![PathLine::delete(path_tokens(&prefix)?)],
        };

        guard.apply(&lines)?;
        let outcome = guard.commit(&self.settings.comment(action, R::KIND, &id))?;
        info!(lines = lines.len(), warnings = outcome.warnings.len(), "committed");

        if self.settings.verify_after_commit && action != Action::Delete {
            if guard.read(record, &parser)?.is_none() {
                return Err(Error::VerificationFailed(id));
            }
        }

        Ok(TxOutcome {
            warnings: outcome.warnings,
            lines_applied: lines.len(),
        })
    }
}
