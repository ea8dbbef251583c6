//! `forwarding-options dhcp-relay group` and its DHCPv6 counterpart

use crate::error::{Error, Result};
use crate::identity::{expect_components, routing_context_prefix, routing_instance_or_default};
use crate::line::quote;
use crate::merge::Keyed;
use crate::parser::FieldTable;
use crate::record::{ConfigObject, ConfigRecord};
use crate::serializer::{exclusive, required_with, unique_keys, variant_only, LineWriter};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DHCP protocol version of a relay group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayVersion {
    #[default]
    V4,
    V6,
}

impl fmt::Display for RelayVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayVersion::V4 => write!(f, "v4"),
            RelayVersion::V6 => write!(f, "v6"),
        }
    }
}

impl FromStr for RelayVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "v4" => Ok(RelayVersion::V4),
            "v6" => Ok(RelayVersion::V6),
            other => Err(Error::InvalidIdentifier(format!(
                "unknown dhcp-relay version '{}', expected v4 or v6",
                other
            ))),
        }
    }
}

/// A DHCP relay group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DhcpRelayGroup {
    pub name: String,
    /// Routing instance; empty or `default` means the configuration root
    pub routing_instance: String,
    pub version: RelayVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_server_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub forward_only: bool,
    pub forward_only_replies: bool,
    /// Routing instance to forward into; needs `forward_only`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_only_routing_instance: Option<String>,
    pub remote_id_mismatch_disconnect: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<RelayInterface>,
    /// v4 only
    pub relay_option_82_circuit_id: bool,
    /// v6 only
    pub relay_agent_interface_id: bool,
}

/// Interface attached to a relay group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayInterface {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Exclude the interface; no other option may be set alongside
    pub exclude: bool,
    pub trace: bool,
    /// Upper end of an interface range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upto: Option<String>,
}

impl Keyed for RelayInterface {
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

impl DhcpRelayGroup {
    /// Identity-only group.
    pub fn named(
        name: impl Into<String>,
        routing_instance: impl Into<String>,
        version: RelayVersion,
    ) -> Self {
        Self {
            name: name.into(),
            routing_instance: routing_instance.into(),
            version,
            ..Default::default()
        }
    }
}

impl ConfigRecord for DhcpRelayGroup {
    fn validate(&self) -> Result<()> {
        required_with(
            "forward-only routing-instance",
            self.forward_only_routing_instance.is_some(),
            "forward-only",
            self.forward_only,
        )?;
        variant_only(
            "relay-option-82 circuit-id",
            self.relay_option_82_circuit_id,
            "version v4",
            self.version == RelayVersion::V4,
        )?;
        variant_only(
            "relay-agent-interface-id",
            self.relay_agent_interface_id,
            "version v6",
            self.version == RelayVersion::V6,
        )?;
        unique_keys("interface", &self.interfaces)?;
        for interface in &self.interfaces {
            exclusive(
                "interface exclude",
                interface.exclude,
                "other interface options",
                interface.description.is_some() || interface.trace || interface.upto.is_some(),
            )?;
        }
        Ok(())
    }

    fn write_lines(&self, w: &mut LineWriter) -> Result<()> {
        w.value("active-server-group", self.active_server_group.as_ref());
        w.value("description", self.description.as_ref());
        w.flag("forward-only", self.forward_only);
        w.value(
            "forward-only routing-instance",
            self.forward_only_routing_instance.as_ref(),
        );
        w.flag("forward-only-replies", self.forward_only_replies);
        w.flag(
            "remote-id-mismatch disconnect",
            self.remote_id_mismatch_disconnect,
        );
        w.flag("relay-option-82 circuit-id", self.relay_option_82_circuit_id);
        w.flag("relay-agent-interface-id", self.relay_agent_interface_id);
        w.blocks("interface", &self.interfaces)?;
        if w.is_empty() {
            w.declare();
        }
        Ok(())
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<DhcpRelayGroup>> = Lazy::new(|| {
            FieldTable::<DhcpRelayGroup>::new()
                .on("active-server-group", |r, v| {
                    r.active_server_group = Some(v.text()?);
                    Ok(())
                })
                .on("description", |r, v| {
                    r.description = Some(v.text()?);
                    Ok(())
                })
                .on("forward-only", |r, v| {
                    if !v.rest().is_empty() {
                        v.reject();
                    }
                    r.forward_only = true;
                    Ok(())
                })
                .on("forward-only routing-instance", |r, v| {
                    r.forward_only = true;
                    r.forward_only_routing_instance = Some(v.text()?);
                    Ok(())
                })
                .flag("forward-only-replies", |r| r.forward_only_replies = true)
                .flag("remote-id-mismatch disconnect", |r| {
                    r.remote_id_mismatch_disconnect = true
                })
                .flag("relay-option-82 circuit-id", |r| {
                    r.relay_option_82_circuit_id = true
                })
                .flag("relay-agent-interface-id", |r| {
                    r.relay_agent_interface_id = true
                })
                .on("interface", |r, v| v.upsert(&mut r.interfaces))
        });
        &TABLE
    }
}

impl ConfigRecord for RelayInterface {
    fn write_lines(&self, w: &mut LineWriter) -> Result<()> {
        w.value("description", self.description.as_ref());
        w.flag("exclude", self.exclude);
        w.flag("trace", self.trace);
        w.value("upto", self.upto.as_ref());
        Ok(())
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<RelayInterface>> = Lazy::new(|| {
            FieldTable::<RelayInterface>::new()
                .on("description", |r, v| {
                    r.description = Some(v.text()?);
                    Ok(())
                })
                .flag("exclude", |r| r.exclude = true)
                .flag("trace", |r| r.trace = true)
                .on("upto", |r, v| {
                    r.upto = Some(v.text()?);
                    Ok(())
                })
        });
        &TABLE
    }
}

impl ConfigObject for DhcpRelayGroup {
    const KIND: &'static str = "dhcp-relay-group";

    fn path_prefix(&self) -> String {
        let base = match self.version {
            RelayVersion::V4 => "forwarding-options dhcp-relay group",
            RelayVersion::V6 => "forwarding-options dhcp-relay dhcpv6 group",
        };
        routing_context_prefix(
            &self.routing_instance,
            &format!("{} {}", base, quote(&self.name)),
        )
    }

    fn id_components(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            routing_instance_or_default(&self.routing_instance),
            self.version.to_string(),
        ]
    }

    fn from_id_components(parts: &[String]) -> Result<Self> {
        let parts = expect_components(Self::KIND, parts, 3)?;
        Ok(Self::named(
            parts[0].clone(),
            parts[1].clone(),
            parts[2].parse()?,
        ))
    }

    fn adopt_identity(&mut self, other: &Self) {
        self.name = other.name.clone();
        self.routing_instance = other.routing_instance.clone();
        self.version = other.version;
    }
}
