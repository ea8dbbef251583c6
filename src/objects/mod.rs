//! Configuration object kinds.
//!
//! Each kind is a plain serde struct plus a [`ConfigRecord`](crate::record::ConfigRecord)
//! implementation that names its device paths, and a
//! [`ConfigObject`](crate::record::ConfigObject) implementation that derives its
//! location and composite identifier.

pub mod address_pool;
pub mod dhcp_relay;
pub mod routing_instance;

pub use address_pool::{
    AddressPool, DhcpAttributes, ExcludedRange, FamilyKind, PoolFamily, PoolRange,
    XauthAttributes,
};
pub use dhcp_relay::{DhcpRelayGroup, RelayInterface, RelayVersion};
pub use routing_instance::RoutingInstance;
