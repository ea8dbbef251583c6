//! # Setconf - Set-Style Configuration Engine
//!
//! Setconf moves typed configuration records to and from devices that speak
//! a hierarchical `set <path> <value>` / `delete <path>` dialect, and applies
//! changes under a configuration lock with commit-or-rollback semantics.
//!
//! ## Core Concepts
//!
//! - **PathLines**: one `set`/`delete` command with its quoted path
//! - **Records**: nested, statically-typed structs describing one object
//! - **Serializer**: record + path prefix to an ordered batch of lines
//! - **Parser**: `display set relative` output back to a record, merging
//!   repeated sub-blocks by key
//! - **Sessions**: lockable device connections behind a trait
//! - **Transactions**: lock, apply, commit, verify, always unlock and close
//!
//! ## Architecture Overview
//!
//! ```text
//!   record ──► serializer ──► PathLines ──► TransactionCoordinator ──► SessionHandle ──► device
//!                                                   │
//!   record ◄── ConfigParser ◄── framed output ◄─────┘ (show configuration ... | display set relative)
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use setconf::prelude::*;
//!
//! let device = MemoryDevice::new("lab-mx");
//! let tx = TransactionCoordinator::new(device.clone());
//!
//! let pool = AddressPool {
//!     active_drain: true,
//!     link: Some("ae0".to_string()),
//!     ..AddressPool::named("POOL1", "default")
//! };
//! tx.create(&pool)?;
//!
//! let read: Option<AddressPool> = tx.read_by_id("POOL1_-_default")?;
//! assert_eq!(read.map(|p| p.link), Some(Some("ae0".to_string())));
//! # Ok::<(), setconf::Error>(())
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::error::{Error, Result};
    pub use crate::identity::CompositeId;
    pub use crate::line::{Operation, PathLine};
    pub use crate::merge::Keyed;
    pub use crate::objects::{AddressPool, DhcpRelayGroup, RelayVersion, RoutingInstance};
    pub use crate::parser::{ConfigParser, Parsed};
    pub use crate::record::{ConfigObject, ConfigRecord};
    pub use crate::serializer::{serialize, LineWriter};
    pub use crate::session::{Connector, MemoryDevice, SessionHandle};
    pub use crate::transaction::{DeviceLock, TransactionCoordinator, TxOutcome, TxSettings};
}

// ============================================================================
// Core
// ============================================================================

/// Error types and result aliases for Setconf operations.
pub mod error;

/// Single configuration lines, quoting and tokenizing.
pub mod line;

/// Keyed upsert of repeated sub-blocks.
pub mod merge;

/// Traits every record and object kind implements.
pub mod record;

/// Composite identifiers.
pub mod identity;

// ============================================================================
// Engine
// ============================================================================

/// Record to line serialization and cross-field constraints.
pub mod serializer;

/// Device output to record parsing.
///
/// Framed `display set relative` output is dispatched line by line through a
/// per-record [`FieldTable`](parser::FieldTable), longest pattern first.
pub mod parser;

/// Device sessions and the in-memory device.
pub mod session;

/// Lock, apply, commit, verify, cleanup.
pub mod transaction;

/// Desired versus actual comparison.
pub mod drift;

// ============================================================================
// Object kinds and settings
// ============================================================================

/// Shipped object kinds.
pub mod objects;

/// Configuration loading and merging.
pub mod config;

pub use error::{Error, Result};
