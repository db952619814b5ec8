//! Domain model for the `/bridgedomains` agent endpoint.

use serde::{Deserialize, Serialize};

/// A bridge domain, keyed by bridge-domain index in the agent response.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct NodeBridgeDomain {
    #[serde(default)]
    pub name: String,
    /// Whether forwarding is enabled.
    #[serde(default)]
    pub forward: bool,
    /// Member interfaces.
    #[serde(default)]
    pub interfaces: Vec<BridgeDomainInterface>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct BridgeDomainInterface {
    pub sw_if_index: u32,
}
