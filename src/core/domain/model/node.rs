//! Domain model for a cluster node record held by the node store.
//!
//! A record carries the node identity plus one optional payload per category.
//! A payload is `None` until the first successful fetch for that category.

use crate::core::domain::model::{
    category::CategoryPayload, node_bridge_domain::NodeBridgeDomain,
    node_interface::NodeInterface, node_ip_arp::NodeIpArp, node_l2fib::NodeL2Fib,
    node_liveness::NodeLiveness, node_telemetry::NodeTelemetry,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A cluster member and its most recently committed network state.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Node {
    pub id: u32,
    /// Unique key within the store.
    pub name: String,
    /// Dataplane IP address.
    pub ip_address: String,
    /// Management IP address the agent listens on.
    pub management_ip_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness: Option<NodeLiveness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<HashMap<u32, NodeInterface>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_domains: Option<HashMap<u32, NodeBridgeDomain>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2_fibs: Option<HashMap<String, NodeL2Fib>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_arps: Option<Vec<NodeIpArp>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<HashMap<String, NodeTelemetry>>,
    /// Lookup structures derived from the payloads above.
    #[serde(default)]
    pub maps: NodeMaps,
}

/// Derived lookups rebuilt by [`Node::populate_maps`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct NodeMaps {
    /// Dataplane internal interface name to interface index.
    pub interface_by_name: HashMap<String, u32>,
    /// Bridge-domain name to bridge-domain index.
    pub bridge_domain_by_name: HashMap<String, u32>,
    /// ARP IP address to MAC address.
    pub arp_by_ip: HashMap<String, String>,
    /// Outgoing interface index to the MAC keys forwarded through it.
    pub fib_by_interface: HashMap<u32, Vec<String>>,
}

impl Node {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        ip_address: impl Into<String>,
        management_ip_address: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            ip_address: ip_address.into(),
            management_ip_address: management_ip_address.into(),
            ..Default::default()
        }
    }

    /// Replaces the category named by the payload.
    pub fn apply(&mut self, payload: CategoryPayload) {
        match payload {
            CategoryPayload::Liveness(p) => self.liveness = Some(p),
            CategoryPayload::Interfaces(p) => self.interfaces = Some(p),
            CategoryPayload::BridgeDomains(p) => self.bridge_domains = Some(p),
            CategoryPayload::L2Fibs(p) => self.l2_fibs = Some(p),
            CategoryPayload::IpArps(p) => self.ip_arps = Some(p),
            CategoryPayload::Telemetry(p) => self.telemetry = Some(p),
        }
    }

    /// Rebuilds [`NodeMaps`] from the current payloads. Rebuilding from
    /// scratch makes repeated calls yield the same result.
    pub fn populate_maps(&mut self) {
        let mut maps = NodeMaps::default();

        if let Some(interfaces) = &self.interfaces {
            for (index, interface) in interfaces {
                maps.interface_by_name
                    .insert(interface.vpp_internal_name.clone(), *index);
            }
        }

        if let Some(domains) = &self.bridge_domains {
            for (index, domain) in domains {
                maps.bridge_domain_by_name.insert(domain.name.clone(), *index);
            }
        }

        if let Some(arps) = &self.ip_arps {
            for arp in arps {
                maps.arp_by_ip
                    .insert(arp.ip_address.clone(), arp.mac_address.clone());
            }
        }

        if let Some(fibs) = &self.l2_fibs {
            for (mac, fib) in fibs {
                maps.fib_by_interface
                    .entry(fib.outgoing_interface_sw_if_idx)
                    .or_default()
                    .push(mac.clone());
            }
            for macs in maps.fib_by_interface.values_mut() {
                macs.sort();
            }
        }

        self.maps = maps;
    }

    /// Finds an interface by its dataplane internal name, using the derived
    /// map when populated and scanning the payload otherwise.
    #[must_use]
    pub fn interface_by_name(&self, name: &str) -> Option<&NodeInterface> {
        let interfaces = self.interfaces.as_ref()?;
        match self.maps.interface_by_name.get(name) {
            Some(index) => interfaces.get(index),
            None => interfaces.values().find(|i| i.vpp_internal_name == name),
        }
    }
}
