//! Domain model for the `/interfaces` agent endpoint.
//!
//! The endpoint returns a JSON object keyed by software interface index.

use serde::{Deserialize, Serialize};

/// A dataplane interface on a node.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct NodeInterface {
    /// Dataplane internal name (e.g., "loop0", "tap1").
    #[serde(default)]
    pub vpp_internal_name: String,
    /// Logical name assigned by the network plugin.
    #[serde(default)]
    pub name: String,
    /// Interface type code.
    #[serde(default)]
    pub if_type: u32,
    #[serde(default)]
    pub enabled: bool,
    /// MAC address.
    #[serde(default)]
    pub phys_address: String,
    #[serde(default)]
    pub mtu: u32,
    /// Configured addresses, each `IP` or `IP/prefix`.
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap: Option<TapLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vxlan: Option<VxlanLink>,
}

/// TAP link attributes.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct TapLink {
    #[serde(default)]
    pub version: u32,
}

/// VXLAN tunnel attributes.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct VxlanLink {
    #[serde(default)]
    pub src_address: String,
    #[serde(default)]
    pub dst_address: String,
    #[serde(default)]
    pub vni: u32,
}
