//! In-memory device.
//!
//! Keeps an active configuration and a lock-scoped candidate as ordered set
//! lines, answers `show configuration ... | display set [relative]`, and can be
//! told to fail at any step of a transaction.

use super::{CommitOutcome, Connector, SessionHandle};
use crate::error::{Error, Result};
use crate::line::{path_tokens, Operation, PathLine};
use crate::parser::frame_output;
use parking_lot::Mutex;
use std::sync::Arc;

/// Failure injection switches.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Refuse new sessions
    pub connect: bool,
    /// Refuse the configuration lock
    pub lock: bool,
    /// Reject the first submitted line containing this text
    pub reject_line: Option<String>,
    /// Refuse commits
    pub commit: bool,
    /// Warnings returned with every commit
    pub commit_warnings: Vec<String>,
    /// Report commits as successful without activating the candidate
    pub discard_on_commit: bool,
}

#[derive(Debug, Default)]
struct DeviceState {
    active: Vec<PathLine>,
    candidate: Option<Vec<PathLine>>,
    lock_holder: Option<u64>,
    next_session: u64,
    faults: Faults,
    commits: Vec<String>,
    history: Vec<String>,
}

/// A simulated device shared by every session opened on it.
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    name: String,
    state: Arc<Mutex<DeviceState>>,
}

impl MemoryDevice {
    /// Device with an empty configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(DeviceState::default())),
        }
    }

    /// Device seeded with absolute `set` lines, one per line of `config`.
    pub fn with_config(name: impl Into<String>, config: &str) -> Result<Self> {
        let device = Self::new(name);
        device.load(config)?;
        Ok(device)
    }

    /// Apply absolute set/delete lines directly to the active configuration.
    pub fn load(&self, config: &str) -> Result<()> {
        let mut state = self.state.lock();
        for raw in config.lines() {
            let raw = raw.trim();
            if raw.is_empty() || raw.starts_with('#') {
                continue;
            }
            let line = PathLine::parse(raw)?;
            apply_line(&mut state.active, &line);
        }
        Ok(())
    }

    /// Active configuration, rendered.
    pub fn active_config(&self) -> Vec<String> {
        self.state
            .lock()
            .active
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// True while any session holds the configuration lock.
    pub fn is_locked(&self) -> bool {
        self.state.lock().lock_holder.is_some()
    }

    /// Comments of every successful commit, oldest first.
    pub fn commit_log(&self) -> Vec<String> {
        self.state.lock().commits.clone()
    }

    /// Every session call in order, e.g. `lock`, `set ...`, `commit ...`.
    pub fn history(&self) -> Vec<String> {
        self.state.lock().history.clone()
    }

    /// Replace the failure switches.
    pub fn set_faults(&self, faults: Faults) {
        self.state.lock().faults = faults;
    }

    /// Open a session regardless of the connect fault.
    pub fn open_session(&self) -> MemorySession {
        let mut state = self.state.lock();
        state.next_session += 1;
        state.history.push("connect".to_string());
        MemorySession {
            id: state.next_session,
            device: self.clone(),
            closed: false,
        }
    }
}

impl Connector for MemoryDevice {
    fn target(&self) -> &str {
        &self.name
    }

    fn connect(&self) -> Result<Box<dyn SessionHandle>> {
        if self.state.lock().faults.connect {
            return Err(Error::connection_failed(&self.name, "connection refused"));
        }
        Ok(Box::new(self.open_session()))
    }
}

/// One session on a [`MemoryDevice`].
#[derive(Debug)]
pub struct MemorySession {
    id: u64,
    device: MemoryDevice,
    closed: bool,
}

impl MemorySession {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Session("session is closed".to_string()));
        }
        Ok(())
    }

    fn holds_lock(state: &DeviceState, id: u64) -> bool {
        state.lock_holder == Some(id)
    }

    fn release(&self) {
        let mut state = self.device.state.lock();
        if Self::holds_lock(&state, self.id) {
            state.lock_holder = None;
            state.candidate = None;
        }
    }
}

impl SessionHandle for MemorySession {
    fn command(&mut self, command: &str) -> Result<String> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        state.history.push(format!("command {}", command));

        let query = command
            .strip_prefix("show configuration ")
            .ok_or_else(|| Error::Session(format!("unsupported command '{}'", command)))?;
        let (path, display) = query.split_once(" | ").unwrap_or((query, ""));
        let relative = display.trim() == "display set relative";
        let prefix = path_tokens(path)?;

        let lines: Vec<String> = state
            .active
            .iter()
            .filter_map(|line| {
                let rel = line.strip_prefix(&prefix)?;
                Some(if relative {
                    format!("set {}", rel)
                } else {
                    line.to_string()
                })
            })
            .collect();
        Ok(frame_output(&lines))
    }

    fn config_set(&mut self, lines: &[PathLine]) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        if !Self::holds_lock(&state, self.id) {
            return Err(Error::Session("configuration is not locked".to_string()));
        }
        let reject = state.faults.reject_line.clone();
        for line in lines {
            let rendered = line.to_string();
            state.history.push(rendered.clone());
            if let Some(needle) = &reject {
                if rendered.contains(needle.as_str()) {
                    return Err(Error::apply_failed(rendered, "syntax error"));
                }
            }
            if let Some(candidate) = state.candidate.as_mut() {
                apply_line(candidate, line);
            }
        }
        Ok(())
    }

    fn commit_conf(&mut self, comment: &str) -> Result<CommitOutcome> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        if !Self::holds_lock(&state, self.id) {
            return Err(Error::Session("configuration is not locked".to_string()));
        }
        state.history.push(format!("commit {}", comment));
        let warnings = state.faults.commit_warnings.clone();
        if state.faults.commit {
            return Err(Error::CommitFailed {
                message: "configuration check-out failed".to_string(),
                warnings,
            });
        }
        if !state.faults.discard_on_commit {
            if let Some(candidate) = state.candidate.clone() {
                state.active = candidate;
            }
        }
        state.commits.push(comment.to_string());
        Ok(CommitOutcome::with_warnings(warnings))
    }

    fn config_lock(&mut self) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        state.history.push("lock".to_string());
        if state.faults.lock {
            return Err(Error::LockFailed(
                "configuration database modified by another user".to_string(),
            ));
        }
        match state.lock_holder {
            Some(holder) if holder != self.id => Err(Error::LockFailed(format!(
                "configuration database locked by session {}",
                holder
            ))),
            _ => {
                state.lock_holder = Some(self.id);
                state.candidate = Some(state.active.clone());
                Ok(())
            }
        }
    }

    fn config_unlock(&mut self) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        state.history.push("unlock".to_string());
        if !Self::holds_lock(&state, self.id) {
            return Err(Error::Session("configuration is not locked".to_string()));
        }
        state.lock_holder = None;
        state.candidate = None;
        Ok(())
    }

    fn config_clear(&mut self) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.device.state.lock();
        state.history.push("clear".to_string());
        if Self::holds_lock(&state, self.id) {
            state.candidate = Some(state.active.clone());
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.release();
        self.device.state.lock().history.push("close".to_string());
        self.closed = true;
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        if !self.closed {
            self.release();
        }
    }
}

/// Apply one line to a configuration held as ordered set lines.
fn apply_line(config: &mut Vec<PathLine>, line: &PathLine) {
    match line.operation {
        Operation::Set => {
            let mut set = line.clone();
            set.operation = Operation::Set;
            if !config.contains(&set) {
                config.push(set);
            }
        }
        Operation::Delete => {
            let target: Vec<&str> = line.path.iter().map(String::as_str).collect();
            config.retain(|existing| {
                let tokens: Vec<&str> = existing.tokens().collect();
                !tokens.starts_with(&target)
            });
        }
    }
}
