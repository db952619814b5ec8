//! Domain model for the `/l2fibs` agent endpoint.

use serde::{Deserialize, Serialize};

/// An L2 forwarding entry, keyed by MAC address in the agent response.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct NodeL2Fib {
    #[serde(default)]
    pub bridge_domain_idx: u32,
    #[serde(default)]
    pub outgoing_interface_sw_if_idx: u32,
    #[serde(default)]
    pub phys_address: String,
    #[serde(default)]
    pub static_config: bool,
    #[serde(default)]
    pub bridged_virtual_interface: bool,
}
