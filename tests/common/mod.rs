//! Shared test utilities and fixtures for the Setconf test suite.
//!
//! This module provides:
//! - Sample records for every shipped object kind
//! - Seeded in-memory devices
//! - A connector that hands out a prepared session once
//! - Temporary file helpers for record and config files
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use parking_lot::Mutex;
use tempfile::TempDir;

use setconf::error::{Error, Result};
use setconf::objects::{
    AddressPool, DhcpAttributes, DhcpRelayGroup, ExcludedRange, FamilyKind, PoolFamily,
    PoolRange, RelayInterface, RelayVersion, RoutingInstance,
};
use setconf::session::{Connector, MemoryDevice, SessionHandle};

// ============================================================================
// Record fixtures
// ============================================================================

/// Pool carrying every kind of field: flags, values, keyed blocks, lists.
pub fn full_pool(name: &str) -> AddressPool {
    AddressPool {
        active_drain: true,
        link: Some("POOL-OVERFLOW".to_string()),
        family: Some(PoolFamily {
            kind: FamilyKind::Inet,
            network: Some("10.0.0.0/24".to_string()),
            ranges: vec![
                PoolRange {
                    name: "R1".to_string(),
                    low: Some("10.0.0.10".to_string()),
                    high: Some("10.0.0.100".to_string()),
                    prefix_length: None,
                },
                PoolRange {
                    name: "R2".to_string(),
                    low: Some("10.0.0.150".to_string()),
                    high: Some("10.0.0.200".to_string()),
                    prefix_length: None,
                },
            ],
            excluded_ranges: vec![ExcludedRange {
                name: "GW".to_string(),
                low: Some("10.0.0.1".to_string()),
                high: Some("10.0.0.5".to_string()),
            }],
            dhcp_attributes: Some(DhcpAttributes {
                maximum_lease_time: Some(86400),
                domain_name: Some("lab.example.net".to_string()),
                name_server: vec!["192.0.2.53".to_string(), "192.0.2.54".to_string()],
                router: vec!["10.0.0.1".to_string()],
                ..Default::default()
            }),
            xauth_attributes: None,
        }),
        ..AddressPool::named(name, "default")
    }
}

/// Minimal pool: two top-level attributes and no family.
pub fn small_pool(name: &str) -> AddressPool {
    AddressPool {
        active_drain: true,
        link: Some("ae0".to_string()),
        ..AddressPool::named(name, "default")
    }
}

/// VRF with import/export policies.
pub fn vrf(name: &str) -> RoutingInstance {
    RoutingInstance {
        instance_type: Some("vrf".to_string()),
        description: Some("customer A".to_string()),
        route_distinguisher: Some("65000:100".to_string()),
        vrf_import: vec!["IMPORT-A".to_string()],
        vrf_export: vec!["EXPORT-A".to_string()],
        vrf_table_label: true,
        ..RoutingInstance::named(name)
    }
}

/// DHCPv4 relay group with two interfaces.
pub fn relay_group(name: &str, routing_instance: &str) -> DhcpRelayGroup {
    DhcpRelayGroup {
        active_server_group: Some("SERVERS".to_string()),
        interfaces: vec![
            RelayInterface {
                name: "ge-0/0/1.0".to_string(),
                ..Default::default()
            },
            RelayInterface {
                name: "ge-0/0/2.0".to_string(),
                description: Some("users floor 2".to_string()),
                ..Default::default()
            },
        ],
        ..DhcpRelayGroup::named(name, routing_instance, RelayVersion::V4)
    }
}

// ============================================================================
// Devices
// ============================================================================

/// Active configuration of a small edge router.
pub const EDGE_CONFIG: &str = "\
set routing-instances CUST-A instance-type vrf
set routing-instances CUST-A route-distinguisher 65000:1
set access address-assignment pool EXISTING link ae1
set access address-assignment pool EXISTING family inet network 172.16.0.0/16
set system host-name edge1";

/// Device seeded with [`EDGE_CONFIG`].
pub fn edge_device() -> MemoryDevice {
    MemoryDevice::with_config("edge1", EDGE_CONFIG).unwrap()
}

/// Connector handing out one prepared session, then refusing.
pub struct OneShot {
    session: Mutex<Option<Box<dyn SessionHandle>>>,
}

impl OneShot {
    pub fn new(session: impl SessionHandle + 'static) -> Self {
        Self {
            session: Mutex::new(Some(Box::new(session))),
        }
    }
}

impl Connector for OneShot {
    fn target(&self) -> &str {
        "one-shot"
    }

    fn connect(&self) -> Result<Box<dyn SessionHandle>> {
        self.session
            .lock()
            .take()
            .ok_or_else(|| Error::connection_failed("one-shot", "session already used"))
    }
}

// ============================================================================
// Files
// ============================================================================

/// Temporary directory holding test files.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Write `content` to `name` inside the workspace.
    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Render lines as their text form.
pub fn texts<T: ToString>(lines: &[T]) -> Vec<String> {
    lines.iter().map(ToString::to_string).collect()
}
