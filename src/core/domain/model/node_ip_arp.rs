//! Domain model for the `/arps` agent endpoint.

use serde::{Deserialize, Serialize};

/// One ARP table record. The endpoint returns these as a JSON array.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct NodeIpArp {
    /// Software interface index the entry was learned on.
    #[serde(default)]
    pub interface: u32,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}
