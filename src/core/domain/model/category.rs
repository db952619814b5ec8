//! Categories of per-node network state and the tagged payload carried for each.

use crate::core::domain::model::{
    node_bridge_domain::NodeBridgeDomain, node_interface::NodeInterface, node_ip_arp::NodeIpArp,
    node_l2fib::NodeL2Fib, node_liveness::NodeLiveness, node_telemetry::NodeTelemetry,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One kind of per-node network state exposed by a node agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Liveness,
    Interfaces,
    BridgeDomains,
    L2Fibs,
    IpArps,
    /// Present in the data model only. The agent's response could not be
    /// decoded reliably, so fetching it reports `Unsupported`.
    Telemetry,
}

impl Category {
    /// Every category in the data model.
    pub const ALL: [Category; 6] = [
        Category::Liveness,
        Category::Interfaces,
        Category::BridgeDomains,
        Category::L2Fibs,
        Category::IpArps,
        Category::Telemetry,
    ];

    /// The categories collected by default.
    pub const SUPPORTED: [Category; 5] = [
        Category::Liveness,
        Category::Interfaces,
        Category::BridgeDomains,
        Category::L2Fibs,
        Category::IpArps,
    ];

    /// Agent path serving this category.
    #[must_use]
    pub fn default_path(&self) -> &'static str {
        match self {
            Category::Liveness => "/liveness",
            Category::Interfaces => "/interfaces",
            Category::BridgeDomains => "/bridgedomains",
            Category::L2Fibs => "/l2fibs",
            Category::IpArps => "/arps",
            Category::Telemetry => "/telemetry",
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, Category::Telemetry)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Liveness => "liveness",
            Category::Interfaces => "interfaces",
            Category::BridgeDomains => "bridge_domains",
            Category::L2Fibs => "l2_fibs",
            Category::IpArps => "ip_arps",
            Category::Telemetry => "telemetry",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded category payload, tagged with its category at the point the
/// fetch task builds it.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryPayload {
    Liveness(NodeLiveness),
    Interfaces(HashMap<u32, NodeInterface>),
    BridgeDomains(HashMap<u32, NodeBridgeDomain>),
    L2Fibs(HashMap<String, NodeL2Fib>),
    IpArps(Vec<NodeIpArp>),
    Telemetry(HashMap<String, NodeTelemetry>),
}

impl CategoryPayload {
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            CategoryPayload::Liveness(_) => Category::Liveness,
            CategoryPayload::Interfaces(_) => Category::Interfaces,
            CategoryPayload::BridgeDomains(_) => Category::BridgeDomains,
            CategoryPayload::L2Fibs(_) => Category::L2Fibs,
            CategoryPayload::IpArps(_) => Category::IpArps,
            CategoryPayload::Telemetry(_) => Category::Telemetry,
        }
    }
}
