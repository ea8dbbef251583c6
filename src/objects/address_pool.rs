//! `access address-assignment pool`

use crate::error::{Error, Result};
use crate::identity::{expect_components, routing_context_prefix, routing_instance_or_default};
use crate::line::quote;
use crate::merge::Keyed;
use crate::parser::{Field, FieldTable};
use crate::record::{ConfigObject, ConfigRecord};
use crate::serializer::{exclusive, required, required_with, unique_keys, variant_only, LineWriter};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An address assignment pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressPool {
    /// Pool name
    pub name: String,
    /// Routing instance; empty or `default` means the configuration root
    pub routing_instance: String,
    /// Stop handing out addresses from this pool
    pub active_drain: bool,
    /// Place the pool in hold-down
    pub hold_down: bool,
    /// Name of the pool to use once this one is exhausted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Address family block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<PoolFamily>,
}

/// Address family of a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyKind {
    #[default]
    Inet,
    Inet6,
}

impl fmt::Display for FamilyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FamilyKind::Inet => write!(f, "inet"),
            FamilyKind::Inet6 => write!(f, "inet6"),
        }
    }
}

/// `family inet` / `family inet6` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolFamily {
    pub kind: FamilyKind,
    /// Network the pool allocates from, in CIDR form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<PoolRange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded_ranges: Vec<ExcludedRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_attributes: Option<DhcpAttributes>,
    /// Only valid under `family inet`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xauth_attributes: Option<XauthAttributes>,
}

impl PoolFamily {
    /// Empty block of the given family.
    pub fn new(kind: FamilyKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }
}

/// Named address range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolRange {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
    /// Delegated prefix length, inet6 only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u8>,
}

/// Named range excluded from allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludedRange {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
}

/// DHCP attributes handed to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DhcpAttributes {
    /// Lease time in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_lease_time: Option<u32>,
    pub maximum_lease_time_infinite: bool,
    /// Grace period in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    /// Name servers; order is not significant
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name_server: Vec<String>,
    /// WINS servers; order is not significant
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wins_server: Vec<String>,
    /// Default routers, in preference order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub router: Vec<String>,
    /// Interface whose DHCP client settings are propagated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagate_settings: Option<String>,
}

/// Extended authentication DNS servers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XauthAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_dns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_dns: Option<String>,
}

impl Keyed for PoolRange {
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

impl Keyed for ExcludedRange {
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

// ============================================================================
// Serialization
// ============================================================================

impl ConfigRecord for AddressPool {
    fn validate(&self) -> Result<()> {
        match &self.family {
            Some(family) => family.validate(),
            None => Ok(()),
        }
    }

    fn write_lines(&self, w: &mut LineWriter) -> Result<()> {
        w.flag("active-drain", self.active_drain);
        w.flag("hold-down", self.hold_down);
        w.value("link", self.link.as_ref());
        if let Some(family) = &self.family {
            w.nested(&format!("family {}", family.kind), family)?;
        }
        Ok(())
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<AddressPool>> = Lazy::new(|| {
            FieldTable::<AddressPool>::new()
                .flag("active-drain", |r| r.active_drain = true)
                .flag("hold-down", |r| r.hold_down = true)
                .on("link", |r, v| {
                    r.link = Some(v.text()?);
                    Ok(())
                })
                .on("family inet", |r, v| family(r, v, FamilyKind::Inet))
                .on("family inet6", |r, v| family(r, v, FamilyKind::Inet6))
        });
        &TABLE
    }
}

fn family(pool: &mut AddressPool, field: &Field<'_>, kind: FamilyKind) -> Result<()> {
    let block = pool.family.get_or_insert_with(|| PoolFamily::new(kind));
    if block.kind != kind {
        return Err(Error::parse(
            field.line(),
            format!("pool already carries family {}", block.kind),
        ));
    }
    if field.rest().is_empty() {
        return Ok(());
    }
    field.descend(block)
}

impl ConfigRecord for PoolFamily {
    fn validate(&self) -> Result<()> {
        required("family network", self.network.is_some())?;
        unique_keys("range", &self.ranges)?;
        unique_keys("excluded-range", &self.excluded_ranges)?;
        let inet6 = self.kind == FamilyKind::Inet6;
        for range in &self.ranges {
            let bounds = range.low.is_some() || range.high.is_some();
            required_with("range low", range.low.is_some(), "range high", range.high.is_some())?;
            required_with("range high", range.high.is_some(), "range low", range.low.is_some())?;
            variant_only(
                "range prefix-length",
                range.prefix_length.is_some(),
                "family inet6",
                inet6,
            )?;
            exclusive("range prefix-length", range.prefix_length.is_some(), "range low", bounds)?;
            if !bounds && range.prefix_length.is_none() {
                return Err(Error::validation(
                    "range",
                    format!("'{}' needs low and high or prefix-length", range.name),
                ));
            }
        }
        for range in &self.excluded_ranges {
            required("excluded-range low", range.low.is_some())?;
            required("excluded-range high", range.high.is_some())?;
        }
        if let Some(dhcp) = &self.dhcp_attributes {
            dhcp.validate()?;
        }
        variant_only(
            "xauth-attributes",
            self.xauth_attributes.is_some(),
            "family inet",
            self.kind == FamilyKind::Inet,
        )
    }

    fn write_lines(&self, w: &mut LineWriter) -> Result<()> {
        w.value("network", self.network.as_ref());
        w.blocks("range", &self.ranges)?;
        w.blocks("excluded-range", &self.excluded_ranges)?;
        if let Some(dhcp) = &self.dhcp_attributes {
            w.nested("dhcp-attributes", dhcp)?;
        }
        if let Some(xauth) = &self.xauth_attributes {
            w.nested("xauth-attributes", xauth)?;
        }
        Ok(())
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<PoolFamily>> = Lazy::new(|| {
            FieldTable::<PoolFamily>::new()
                .on("network", |r, v| {
                    r.network = Some(v.text()?);
                    Ok(())
                })
                .on("range", |r, v| v.upsert(&mut r.ranges))
                .on("excluded-range", |r, v| v.upsert(&mut r.excluded_ranges))
                .on("dhcp-attributes", |r, v| {
                    v.descend(r.dhcp_attributes.get_or_insert_with(Default::default))
                })
                .on("xauth-attributes", |r, v| {
                    v.descend(r.xauth_attributes.get_or_insert_with(Default::default))
                })
        });
        &TABLE
    }
}

impl ConfigRecord for PoolRange {
    fn write_lines(&self, w: &mut LineWriter) -> Result<()> {
        w.value("low", self.low.as_ref());
        w.value("high", self.high.as_ref());
        w.value("prefix-length", self.prefix_length.as_ref());
        Ok(())
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<PoolRange>> = Lazy::new(|| {
            FieldTable::<PoolRange>::new()
                .on("low", |r, v| {
                    r.low = Some(v.text()?);
                    Ok(())
                })
                .on("high", |r, v| {
                    r.high = Some(v.text()?);
                    Ok(())
                })
                .on("prefix-length", |r, v| {
                    r.prefix_length = Some(v.number()?);
                    Ok(())
                })
        });
        &TABLE
    }
}

impl ConfigRecord for ExcludedRange {
    fn write_lines(&self, w: &mut LineWriter) -> Result<()> {
        w.value("low", self.low.as_ref());
        w.value("high", self.high.as_ref());
        Ok(())
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<ExcludedRange>> = Lazy::new(|| {
            FieldTable::<ExcludedRange>::new()
                .on("low", |r, v| {
                    r.low = Some(v.text()?);
                    Ok(())
                })
                .on("high", |r, v| {
                    r.high = Some(v.text()?);
                    Ok(())
                })
        });
        &TABLE
    }
}

impl ConfigRecord for DhcpAttributes {
    fn validate(&self) -> Result<()> {
        exclusive(
            "dhcp-attributes maximum-lease-time",
            self.maximum_lease_time.is_some(),
            "maximum-lease-time infinite",
            self.maximum_lease_time_infinite,
        )
    }

    fn write_lines(&self, w: &mut LineWriter) -> Result<()> {
        w.value("maximum-lease-time", self.maximum_lease_time.as_ref());
        w.flag("maximum-lease-time infinite", self.maximum_lease_time_infinite);
        w.value("grace-period", self.grace_period.as_ref());
        w.value("domain-name", self.domain_name.as_ref());
        w.set_list("name-server", &self.name_server);
        w.set_list("wins-server", &self.wins_server);
        w.list("router", &self.router);
        w.value("propagate-settings", self.propagate_settings.as_ref());
        Ok(())
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<DhcpAttributes>> = Lazy::new(|| {
            FieldTable::<DhcpAttributes>::new()
                .flag("maximum-lease-time infinite", |r| {
                    r.maximum_lease_time_infinite = true
                })
                .on("maximum-lease-time", |r, v| {
                    r.maximum_lease_time = Some(v.number()?);
                    Ok(())
                })
                .on("grace-period", |r, v| {
                    r.grace_period = Some(v.number()?);
                    Ok(())
                })
                .on("domain-name", |r, v| {
                    r.domain_name = Some(v.text()?);
                    Ok(())
                })
                .on("name-server", |r, v| {
                    r.name_server.push(v.text()?);
                    Ok(())
                })
                .on("wins-server", |r, v| {
                    r.wins_server.push(v.text()?);
                    Ok(())
                })
                .on("router", |r, v| {
                    r.router.push(v.text()?);
                    Ok(())
                })
                .on("propagate-settings", |r, v| {
                    r.propagate_settings = Some(v.text()?);
                    Ok(())
                })
        });
        &TABLE
    }
}

impl ConfigRecord for XauthAttributes {
    fn write_lines(&self, w: &mut LineWriter) -> Result<()> {
        w.value("primary-dns", self.primary_dns.as_ref());
        w.value("secondary-dns", self.secondary_dns.as_ref());
        Ok(())
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<XauthAttributes>> = Lazy::new(|| {
            FieldTable::<XauthAttributes>::new()
                .on("primary-dns", |r, v| {
                    r.primary_dns = Some(v.text()?);
                    Ok(())
                })
                .on("secondary-dns", |r, v| {
                    r.secondary_dns = Some(v.text()?);
                    Ok(())
                })
        });
        &TABLE
    }
}

// ============================================================================
// Identity
// ============================================================================

impl AddressPool {
    /// Identity-only pool.
    pub fn named(name: impl Into<String>, routing_instance: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routing_instance: routing_instance.into(),
            ..Default::default()
        }
    }
}

impl ConfigObject for AddressPool {
    const KIND: &'static str = "address-pool";

    fn path_prefix(&self) -> String {
        routing_context_prefix(
            &self.routing_instance,
            &format!("access address-assignment pool {}", quote(&self.name)),
        )
    }

    fn id_components(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            routing_instance_or_default(&self.routing_instance),
        ]
    }

    fn from_id_components(parts: &[String]) -> Result<Self> {
        let parts = expect_components(Self::KIND, parts, 2)?;
        Ok(Self::named(parts[0].clone(), parts[1].clone()))
    }

    fn adopt_identity(&mut self, other: &Self) {
        self.name = other.name.clone();
        self.routing_instance = other.routing_instance.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_record, ConfigParser};
    use crate::serializer::serialize;
    use pretty_assertions::assert_eq;

    fn render(pool: &AddressPool) -> Vec<String> {
        serialize(pool, &pool.path_prefix())
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_drain_and_link() {
        let pool = AddressPool {
            active_drain: true,
            link: Some("ae0".into()),
            ..AddressPool::named("POOL1", "")
        };
        assert_eq!(
            render(&pool),
            vec![
                "set access address-assignment pool POOL1 active-drain",
                "set access address-assignment pool POOL1 link ae0",
            ]
        );
    }

    #[test]
    fn test_excluded_range_lines_merge() {
        let out = "set family inet network 10.0.0.0/24\n\
                   set family inet excluded-range R1 low 10.0.0.1\n\
                   set family inet excluded-range R1 high 10.0.0.10";
        let pool: AddressPool = parse_record(out).unwrap();
        let family = pool.family.unwrap();
        assert_eq!(
            family.excluded_ranges,
            vec![ExcludedRange {
                name: "R1".into(),
                low: Some("10.0.0.1".into()),
                high: Some("10.0.0.10".into()),
            }]
        );
    }

    #[test]
    fn test_routing_instance_prefix() {
        let pool = AddressPool::named("P1", "CUST-A");
        assert_eq!(
            pool.path_prefix(),
            "routing-instances CUST-A access address-assignment pool P1"
        );
        assert_eq!(pool.composite_id("_-_").unwrap().to_string(), "P1_-_CUST-A");
        assert_eq!(
            AddressPool::named("P1", "").composite_id("_-_").unwrap().to_string(),
            "P1_-_default"
        );
    }

    #[test]
    fn test_lease_time_disambiguation() {
        let out = "set family inet network 10.0.0.0/24\nset family inet dhcp-attributes maximum-lease-time infinite";
        let pool: AddressPool = parse_record(out).unwrap();
        let dhcp = pool.family.unwrap().dhcp_attributes.unwrap();
        assert!(dhcp.maximum_lease_time_infinite);
        assert_eq!(dhcp.maximum_lease_time, None);
    }

    #[test]
    fn test_lease_time_conflict() {
        let pool = AddressPool {
            family: Some(PoolFamily {
                network: Some("10.0.0.0/24".into()),
                dhcp_attributes: Some(DhcpAttributes {
                    maximum_lease_time: Some(3600),
                    maximum_lease_time_infinite: true,
                    ..Default::default()
                }),
                ..PoolFamily::new(FamilyKind::Inet)
            }),
            ..AddressPool::named("P1", "")
        };
        assert!(matches!(
            serialize(&pool, &pool.path_prefix()),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_prefix_length_only_for_inet6() {
        let mut family = PoolFamily {
            network: Some("10.0.0.0/24".into()),
            ranges: vec![PoolRange {
                name: "R1".into(),
                prefix_length: Some(64),
                ..Default::default()
            }],
            ..PoolFamily::new(FamilyKind::Inet)
        };
        assert!(family.validate().is_err());
        family.kind = FamilyKind::Inet6;
        family.network = Some("2001:db8::/48".into());
        assert!(family.validate().is_ok());
    }

    #[test]
    fn test_xauth_only_for_inet() {
        let family = PoolFamily {
            network: Some("2001:db8::/48".into()),
            xauth_attributes: Some(XauthAttributes {
                primary_dns: Some("2001:db8::53/128".into()),
                secondary_dns: None,
            }),
            ..PoolFamily::new(FamilyKind::Inet6)
        };
        assert!(family.validate().is_err());
    }

    #[test]
    fn test_full_round_trip() {
        let pool = AddressPool {
            hold_down: true,
            family: Some(PoolFamily {
                network: Some("192.0.2.0/24".into()),
                ranges: vec![PoolRange {
                    name: "R1".into(),
                    low: Some("192.0.2.10".into()),
                    high: Some("192.0.2.200".into()),
                    prefix_length: None,
                }],
                excluded_ranges: vec![ExcludedRange {
                    name: "X1".into(),
                    low: Some("192.0.2.50".into()),
                    high: Some("192.0.2.60".into()),
                }],
                dhcp_attributes: Some(DhcpAttributes {
                    maximum_lease_time: Some(86400),
                    domain_name: Some("example.net".into()),
                    name_server: vec!["192.0.2.2".into(), "192.0.2.1".into()],
                    router: vec!["192.0.2.254".into(), "192.0.2.253".into()],
                    ..Default::default()
                }),
                xauth_attributes: Some(XauthAttributes {
                    primary_dns: Some("192.0.2.1/32".into()),
                    secondary_dns: None,
                }),
                ..PoolFamily::new(FamilyKind::Inet)
            }),
            ..AddressPool::named("P1", "")
        };
        let prefix = pool.path_prefix();
        let lines = serialize(&pool, &prefix).unwrap();
        let parsed = ConfigParser::new()
            .with_strip_prefix(&prefix)
            .unwrap()
            .parse_lines::<AddressPool>(&lines)
            .unwrap();
        assert!(parsed.found);

        let mut back = parsed.record;
        back.adopt_identity(&pool);
        let mut expected = pool.clone();
        if let Some(dhcp) = expected
            .family
            .as_mut()
            .and_then(|f| f.dhcp_attributes.as_mut())
        {
            dhcp.name_server.sort();
        }
        assert_eq!(back, expected);
    }

    #[test]
    fn test_mixed_families_are_rejected() {
        let out = "set family inet network 10.0.0.0/24\nset family inet6 network 2001:db8::/48";
        assert!(parse_record::<AddressPool>(out).is_err());
    }
}
