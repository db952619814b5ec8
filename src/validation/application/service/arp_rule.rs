use crate::core::domain::model::{finding::Finding, node::Node};
use crate::validation::application::service::validation_engine::ValidationRule;

/// Cross-node ARP table consistency.
///
/// Registered so that the check has a stable name and slot in the engine. The
/// expected relation between ARP tables on different nodes is not defined, so
/// the rule reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArpTableRule;

impl ValidationRule for ArpTableRule {
    fn name(&self) -> &'static str {
        "arp-table"
    }

    fn validate(&self, _nodes: &[Node]) -> Vec<Finding> {
        Vec::new()
    }
}
