use crate::core::domain::model::{finding::Finding, node::Node};
use crate::validation::application::service::{
    arp_rule::ArpTableRule, loopback_rule::LoopbackAddressRule,
};

/// A cross-node consistency check evaluated over a committed snapshot.
///
/// Rules must be pure with respect to the snapshot: the only effect of a run is
/// the returned findings, so a rule can be re-run any number of times.
pub trait ValidationRule: Send + Sync {
    /// Short identifier used to tag findings.
    fn name(&self) -> &'static str;

    /// Evaluates the rule over every node in the snapshot.
    fn validate(&self, nodes: &[Node]) -> Vec<Finding>;
}

/// Hosts the validation rules run at the end of every collection cycle.
#[derive(Default)]
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    /// Creates an engine with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the loopback address rule and the ARP table
    /// rule.
    pub fn with_default_rules(loopback_interface: &str) -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(LoopbackAddressRule::new(loopback_interface)));
        engine.add_rule(Box::new(ArpTableRule));
        engine
    }

    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Runs every rule in registration order.
    pub fn run(&self, nodes: &[Node]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            let found = rule.validate(nodes);
            tracing::debug!(rule = rule.name(), findings = found.len(), "validation rule evaluated");
            findings.extend(found);
        }
        findings
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("rules", &self.rule_names())
            .finish()
    }
}
