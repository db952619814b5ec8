//! In-memory node snapshot store shared by the collector and external callers.

use crate::core::domain::{
    error::{TelemetryError, TelemetryResult},
    model::{
        category::CategoryPayload,
        change_event::NodeInfo,
        collector_config::DEFAULT_LOOPBACK_INTERFACE,
        finding::Finding,
        node::Node,
        node_bridge_domain::NodeBridgeDomain,
        node_interface::NodeInterface,
        node_ip_arp::NodeIpArp,
        node_l2fib::NodeL2Fib,
        node_liveness::NodeLiveness,
        node_telemetry::NodeTelemetry,
    },
    value_object::{validate_management_address, validate_node_name},
};
use crate::validation::application::service::{
    loopback_rule::LoopbackAddressRule,
    validation_engine::{ValidationEngine, ValidationRule},
};
use std::collections::{BTreeSet, HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct StoreState {
    nodes: HashMap<String, Node>,
    report: Vec<String>,
}

/// Outcome of [`NodeStore::commit_cycle`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleCommit {
    /// Payloads written to their node.
    pub committed: usize,
    /// Payloads whose node was no longer in the store.
    pub dropped: usize,
    pub findings: Vec<Finding>,
}

/// One record per cluster node plus the append-only report log.
///
/// Every operation takes the internal lock, and readers always receive owned
/// copies, so a caller never observes a record halfway through an update.
#[derive(Debug)]
pub struct NodeStore {
    state: RwLock<StoreState>,
    loopback_interface: String,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    pub fn new() -> Self {
        Self::with_loopback_interface(DEFAULT_LOOPBACK_INTERFACE)
    }

    pub fn with_loopback_interface(loopback_interface: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            loopback_interface: loopback_interface.into(),
        }
    }

    /// Inserts a new node record.
    ///
    /// # Errors
    /// `DuplicateNode` if the name is taken; a validation error if the name or
    /// management address is malformed.
    pub async fn add_node(
        &self,
        id: u32,
        name: &str,
        ip_address: &str,
        management_ip_address: &str,
    ) -> TelemetryResult<()> {
        validate_node_name(name)?;
        validate_management_address(management_ip_address)?;

        let mut state = self.state.write().await;
        if state.nodes.contains_key(name) {
            return Err(TelemetryError::DuplicateNode(name.to_string()));
        }
        state.nodes.insert(
            name.to_string(),
            Node::new(id, name, ip_address, management_ip_address),
        );
        tracing::debug!(node = name, id, "node added");
        Ok(())
    }

    /// Removes the named records. Absent names are ignored.
    pub async fn delete_nodes<S: AsRef<str>>(&self, names: &[S]) {
        let mut state = self.state.write().await;
        for name in names {
            if state.nodes.remove(name.as_ref()).is_some() {
                tracing::debug!(node = name.as_ref(), "node deleted");
            }
        }
    }

    pub async fn get_node(&self, name: &str) -> TelemetryResult<Node> {
        self.state
            .read()
            .await
            .nodes
            .get(name)
            .cloned()
            .ok_or_else(|| TelemetryError::NotFound(name.to_string()))
    }

    /// Copies of every record, ordered by name.
    pub async fn get_all_nodes(&self) -> Vec<Node> {
        let state = self.state.read().await;
        sorted(state.nodes.values().cloned().collect())
    }

    /// Copies of the named records that exist, in request order.
    pub async fn lookup_nodes<S: AsRef<str>>(&self, names: &[S]) -> Vec<Node> {
        let state = self.state.read().await;
        names
            .iter()
            .filter_map(|name| state.nodes.get(name.as_ref()).cloned())
            .collect()
    }

    pub async fn node_count(&self) -> usize {
        self.state.read().await.nodes.len()
    }

    /// Replaces one category of an existing node.
    ///
    /// # Errors
    /// `NotFound` if the node is absent; the node is not created.
    pub async fn apply_payload(&self, name: &str, payload: CategoryPayload) -> TelemetryResult<()> {
        let mut state = self.state.write().await;
        let node = state
            .nodes
            .get_mut(name)
            .ok_or_else(|| TelemetryError::NotFound(name.to_string()))?;
        let category = payload.category();
        node.apply(payload);
        tracing::debug!(node = name, %category, "category committed");
        Ok(())
    }

    pub async fn set_liveness(&self, name: &str, liveness: NodeLiveness) -> TelemetryResult<()> {
        self.apply_payload(name, CategoryPayload::Liveness(liveness))
            .await
    }

    pub async fn set_interfaces(
        &self,
        name: &str,
        interfaces: HashMap<u32, NodeInterface>,
    ) -> TelemetryResult<()> {
        self.apply_payload(name, CategoryPayload::Interfaces(interfaces))
            .await
    }

    pub async fn set_bridge_domains(
        &self,
        name: &str,
        bridge_domains: HashMap<u32, NodeBridgeDomain>,
    ) -> TelemetryResult<()> {
        self.apply_payload(name, CategoryPayload::BridgeDomains(bridge_domains))
            .await
    }

    pub async fn set_l2_fibs(
        &self,
        name: &str,
        l2_fibs: HashMap<String, NodeL2Fib>,
    ) -> TelemetryResult<()> {
        self.apply_payload(name, CategoryPayload::L2Fibs(l2_fibs))
            .await
    }

    pub async fn set_telemetry(
        &self,
        name: &str,
        telemetry: HashMap<String, NodeTelemetry>,
    ) -> TelemetryResult<()> {
        self.apply_payload(name, CategoryPayload::Telemetry(telemetry))
            .await
    }

    pub async fn set_ip_arps(&self, name: &str, ip_arps: Vec<NodeIpArp>) -> TelemetryResult<()> {
        self.apply_payload(name, CategoryPayload::IpArps(ip_arps))
            .await
    }

    /// Rebuilds the derived lookup maps of a node.
    pub async fn populate_node_maps(&self, name: &str) -> TelemetryResult<()> {
        let mut state = self.state.write().await;
        let node = state
            .nodes
            .get_mut(name)
            .ok_or_else(|| TelemetryError::NotFound(name.to_string()))?;
        node.populate_maps();
        Ok(())
    }

    /// Runs the loopback address rule and appends its findings to the report
    /// log. Returns the number of findings.
    pub async fn validate_loop_if_addresses(&self) -> usize {
        let rule = LoopbackAddressRule::new(self.loopback_interface.clone());
        let mut state = self.state.write().await;
        let nodes = sorted(state.nodes.values().cloned().collect());
        let findings = rule.validate(&nodes);
        append_findings(&mut state.report, &findings);
        findings.len()
    }

    /// Runs every rule of `engine` over the current snapshot and appends the
    /// findings to the report log. Holding the write lock for the whole run
    /// keeps the snapshot fixed while the rules evaluate it.
    pub async fn run_validation(&self, engine: &ValidationEngine) -> Vec<Finding> {
        let mut state = self.state.write().await;
        let nodes = sorted(state.nodes.values().cloned().collect());
        let findings = engine.run(&nodes);
        append_findings(&mut state.report, &findings);
        findings
    }

    /// Commits the payloads of one collection cycle, rebuilds the lookup maps
    /// of every node written to and runs `engine`, all under one write lock.
    /// Membership changes therefore land either before or after the whole
    /// commit, and validation sees exactly the committed snapshot.
    pub async fn commit_cycle(
        &self,
        payloads: Vec<(String, CategoryPayload)>,
        engine: &ValidationEngine,
    ) -> CycleCommit {
        let mut state = self.state.write().await;
        let mut outcome = CycleCommit::default();
        let mut touched = BTreeSet::new();

        for (name, payload) in payloads {
            let category = payload.category();
            match state.nodes.get_mut(&name) {
                Some(node) => {
                    node.apply(payload);
                    outcome.committed += 1;
                    touched.insert(name);
                }
                None => {
                    outcome.dropped += 1;
                    tracing::warn!(node = %name, %category, "payload dropped, node no longer in store");
                }
            }
        }

        for name in &touched {
            if let Some(node) = state.nodes.get_mut(name) {
                node.populate_maps();
            }
        }

        let nodes = sorted(state.nodes.values().cloned().collect());
        outcome.findings = engine.run(&nodes);
        append_findings(&mut state.report, &outcome.findings);
        outcome
    }

    /// Removes every node record. The report log is retained.
    pub async fn clear_cache(&self) {
        let mut state = self.state.write().await;
        let removed = state.nodes.len();
        state.nodes.clear();
        state.nodes.shrink_to_fit();
        tracing::debug!(removed, "node cache cleared");
    }

    pub async fn append_report(&self, entry: impl Into<String>) {
        self.state.write().await.report.push(entry.into());
    }

    pub async fn report(&self) -> Vec<String> {
        self.state.read().await.report.clone()
    }

    /// Adds the node or refreshes its identity fields. Category payloads of an
    /// existing node are retained.
    pub async fn upsert_node(&self, info: NodeInfo) -> TelemetryResult<()> {
        validate_node_name(&info.name)?;
        validate_management_address(&info.management_ip_address)?;

        let mut state = self.state.write().await;
        match state.nodes.get_mut(&info.name) {
            Some(node) => {
                node.id = info.id;
                node.ip_address = info.ip_address;
                node.management_ip_address = info.management_ip_address;
                tracing::debug!(node = %info.name, "node refreshed");
            }
            None => {
                tracing::debug!(node = %info.name, id = info.id, "node added");
                let node = Node::new(
                    info.id,
                    info.name.clone(),
                    info.ip_address,
                    info.management_ip_address,
                );
                state.nodes.insert(info.name, node);
            }
        }
        Ok(())
    }

    /// Replaces the entire node set. The incoming set is checked in full before
    /// the store is touched, so a rejected set leaves the store unchanged.
    pub async fn replace_nodes(&self, infos: Vec<NodeInfo>) -> TelemetryResult<()> {
        let mut names = HashSet::with_capacity(infos.len());
        for info in &infos {
            validate_node_name(&info.name)?;
            validate_management_address(&info.management_ip_address)?;
            if !names.insert(info.name.as_str()) {
                return Err(TelemetryError::DuplicateNode(info.name.clone()));
            }
        }

        let nodes: HashMap<String, Node> = infos
            .into_iter()
            .map(|info| {
                let node = Node::new(
                    info.id,
                    info.name.clone(),
                    info.ip_address,
                    info.management_ip_address,
                );
                (info.name, node)
            })
            .collect();

        let mut state = self.state.write().await;
        state.nodes = nodes;
        tracing::info!(nodes = state.nodes.len(), "node set replaced");
        Ok(())
    }
}

fn sorted(mut nodes: Vec<Node>) -> Vec<Node> {
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
    nodes
}

fn append_findings(report: &mut Vec<String>, findings: &[Finding]) {
    for finding in findings {
        tracing::warn!(rule = %finding.rule, nodes = ?finding.nodes, "{}", finding.message);
        report.push(finding.to_string());
    }
}
