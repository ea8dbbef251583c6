//! `routing-instances`

use crate::error::{Error, Result};
use crate::identity::{expect_components, DEFAULT_ROUTING_INSTANCE};
use crate::line::{path_tokens, quote, PathLine};
use crate::parser::FieldTable;
use crate::record::{ConfigObject, ConfigRecord};
use crate::serializer::{required, variant_only, LineWriter};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Attribute paths a routing instance owns. Everything else under the
/// instance (pools, relay groups, protocols) is left alone by an update.
const OWN_PATHS: &[&str] = &[
    "instance-type",
    "description",
    "route-distinguisher",
    "vrf-import",
    "vrf-export",
    "vrf-target",
    "vrf-table-label",
    "no-vrf-advertise",
    "routing-options router-id",
    "routing-options autonomous-system",
];

/// A routing instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingInstance {
    pub name: String,
    /// `vrf`, `virtual-router`, `forwarding`, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_distinguisher: Option<String>,
    /// Import policies, applied in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vrf_import: Vec<String>,
    /// Export policies, applied in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vrf_export: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf_target_import: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf_target_export: Option<String>,
    pub vrf_table_label: bool,
    pub no_vrf_advertise: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autonomous_system: Option<u32>,
}

impl RoutingInstance {
    /// Identity-only instance.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn is_vrf(&self) -> bool {
        self.instance_type.as_deref() == Some("vrf")
    }
}

impl ConfigRecord for RoutingInstance {
    fn validate(&self) -> Result<()> {
        if self.name == DEFAULT_ROUTING_INSTANCE {
            return Err(Error::validation(
                "name",
                format!("'{}' is reserved for the master instance", self.name),
            ));
        }
        required("instance-type", self.instance_type.is_some())?;
        variant_only(
            "vrf-table-label",
            self.vrf_table_label,
            "instance-type vrf",
            self.is_vrf(),
        )
    }

    fn write_lines(&self, w: &mut LineWriter) -> Result<()> {
        w.value("instance-type", self.instance_type.as_ref());
        w.value("description", self.description.as_ref());
        w.value("route-distinguisher", self.route_distinguisher.as_ref());
        w.list("vrf-import", &self.vrf_import);
        w.list("vrf-export", &self.vrf_export);
        w.value("vrf-target", self.vrf_target.as_ref());
        w.value("vrf-target import", self.vrf_target_import.as_ref());
        w.value("vrf-target export", self.vrf_target_export.as_ref());
        w.flag("vrf-table-label", self.vrf_table_label);
        w.flag("no-vrf-advertise", self.no_vrf_advertise);
        w.value("routing-options router-id", self.router_id.as_ref());
        w.value(
            "routing-options autonomous-system",
            self.autonomous_system.as_ref(),
        );
        Ok(())
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<RoutingInstance>> = Lazy::new(|| {
            FieldTable::<RoutingInstance>::new()
                .on("instance-type", |r, v| {
                    r.instance_type = Some(v.text()?);
                    Ok(())
                })
                .on("description", |r, v| {
                    r.description = Some(v.text()?);
                    Ok(())
                })
                .on("route-distinguisher", |r, v| {
                    r.route_distinguisher = Some(v.text()?);
                    Ok(())
                })
                .on("vrf-import", |r, v| {
                    r.vrf_import.push(v.text()?);
                    Ok(())
                })
                .on("vrf-export", |r, v| {
                    r.vrf_export.push(v.text()?);
                    Ok(())
                })
                .on("vrf-target", |r, v| {
                    r.vrf_target = Some(v.text()?);
                    Ok(())
                })
                .on("vrf-target import", |r, v| {
                    r.vrf_target_import = Some(v.text()?);
                    Ok(())
                })
                .on("vrf-target export", |r, v| {
                    r.vrf_target_export = Some(v.text()?);
                    Ok(())
                })
                .flag("vrf-table-label", |r| r.vrf_table_label = true)
                .flag("no-vrf-advertise", |r| r.no_vrf_advertise = true)
                .on("routing-options router-id", |r, v| {
                    r.router_id = Some(v.text()?);
                    Ok(())
                })
                .on("routing-options autonomous-system", |r, v| {
                    r.autonomous_system = Some(v.number()?);
                    Ok(())
                })
        });
        &TABLE
    }

    fn foreign_paths() -> &'static [&'static str] {
        &["access address-assignment pool", "forwarding-options dhcp-relay"]
    }
}

impl ConfigObject for RoutingInstance {
    const KIND: &'static str = "routing-instance";

    fn path_prefix(&self) -> String {
        format!("routing-instances {}", quote(&self.name))
    }

    fn id_components(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn from_id_components(parts: &[String]) -> Result<Self> {
        let parts = expect_components(Self::KIND, parts, 1)?;
        Ok(Self::named(parts[0].clone()))
    }

    fn adopt_identity(&mut self, other: &Self) {
        self.name = other.name.clone();
    }

    fn clear_lines(&self, prefix: &str) -> Result<Vec<PathLine>> {
        let base = path_tokens(prefix)?;
        OWN_PATHS
            .iter()
            .map(|path| {
                let mut tokens = base.clone();
                tokens.extend(path_tokens(path)?);
                Ok(PathLine::delete(tokens))
            })
            .collect()
    }
}
