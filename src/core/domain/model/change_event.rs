//! Node-membership events supplied by the external watch subsystem.

use serde::{Deserialize, Serialize};

/// Identity of a cluster node as announced by the watch subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeInfo {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub management_ip_address: String,
}

/// An incremental membership change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ChangeEvent {
    /// Adds the node, or refreshes its identity fields if it already exists.
    Put(NodeInfo),
    Delete { name: String },
}

/// The complete node set, replacing whatever the store holds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ResyncEvent {
    pub nodes: Vec<NodeInfo>,
}
