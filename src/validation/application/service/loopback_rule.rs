//! Loopback address validation.
//!
//! Every node's loopback interface must carry exactly one well-formed address,
//! and no two nodes may share a loopback address. Inter-node tunnels are
//! terminated on these addresses, so a duplicate breaks connectivity between
//! the nodes involved.

use crate::core::domain::model::{finding::Finding, node::Node};
use crate::core::domain::value_object::InterfaceAddress;
use crate::validation::application::service::validation_engine::ValidationRule;
use std::collections::BTreeMap;
use std::net::IpAddr;

const RULE_NAME: &str = "loopback-address";

/// Checks the loopback interface identified by its dataplane internal name.
#[derive(Debug, Clone)]
pub struct LoopbackAddressRule {
    interface_name: String,
}

impl LoopbackAddressRule {
    pub fn new(interface_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
        }
    }

    fn finding(&self, node: &Node, message: String) -> Finding {
        Finding::new(RULE_NAME, vec![node.name.clone()], message)
    }
}

impl ValidationRule for LoopbackAddressRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn validate(&self, nodes: &[Node]) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut owners: BTreeMap<IpAddr, Vec<String>> = BTreeMap::new();

        let mut ordered: Vec<&Node> = nodes.iter().collect();
        ordered.sort_by(|a, b| a.name.cmp(&b.name));

        for node in ordered {
            let Some(interface) = node.interface_by_name(&self.interface_name) else {
                findings.push(self.finding(
                    node,
                    format!("loopback interface {} not found", self.interface_name),
                ));
                continue;
            };

            match interface.ip_addresses.as_slice() {
                [] => findings.push(self.finding(
                    node,
                    format!(
                        "loopback interface {} has no IP address",
                        self.interface_name
                    ),
                )),
                [address] => match InterfaceAddress::parse(address) {
                    Ok(parsed) => owners.entry(parsed.ip()).or_default().push(node.name.clone()),
                    Err(e) => findings.push(self.finding(
                        node,
                        format!("malformed loopback address '{}': {}", address, e),
                    )),
                },
                many => findings.push(self.finding(
                    node,
                    format!(
                        "loopback interface {} has {} IP addresses, expected exactly one",
                        self.interface_name,
                        many.len()
                    ),
                )),
            }
        }

        for (ip, names) in owners {
            if names.len() > 1 {
                findings.push(Finding::new(
                    RULE_NAME,
                    names,
                    format!("duplicate loopback address {}", ip),
                ));
            }
        }

        findings
    }
}
