mod collection;
mod core;
mod ingest;
mod validation;


pub use crate::collection::application::response::cycle_report::CycleReport;
pub use crate::core::domain::{
    error::{TelemetryError, TelemetryResult, ValidationError},
    model::{
        category::{Category, CategoryPayload},
        change_event::{ChangeEvent, NodeInfo, ResyncEvent},
        collector_config::{
            AgentEndpoint, CollectorConfig, DEFAULT_LOOPBACK_INTERFACE, RateLimitConfig,
        },
        finding::Finding,
        node::{Node, NodeMaps},
        node_bridge_domain::{BridgeDomainInterface, NodeBridgeDomain},
        node_interface::{NodeInterface, TapLink, VxlanLink},
        node_ip_arp::NodeIpArp,
        node_l2fib::NodeL2Fib,
        node_liveness::NodeLiveness,
        node_telemetry::NodeTelemetry,
    },
    value_object::{AgentPort, InterfaceAddress},
};
pub use crate::ingest::application::service::ingest_service::ResyncWatcher;
pub use crate::validation::application::service::{
    arp_rule::ArpTableRule, loopback_rule::LoopbackAddressRule,
    validation_engine::ValidationRule,
};

use crate::{
    collection::application::service::{
        coordinator_service::{CoordinatorHandle, CoordinatorService, CycleRequester},
        fetch_service::FetchService,
    },
    core::infrastructure::{agent_client::AgentClient, node_store::NodeStore},
    ingest::application::service::ingest_service::IngestService,
    validation::application::service::validation_engine::ValidationEngine,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A cache of per-node network state for a cluster.
///
/// The cache holds one record per node, refreshed by collection cycles that
/// fetch every enabled category from every node's agent. A cycle commits only
/// once all of its fetches have reported back, and validation always runs
/// over that complete snapshot.
///
/// # Examples
///
/// ```no_run
/// use node_telemetry::{CollectorConfig, NodeTelemetryCache, TelemetryResult};
///
/// #[tokio::main]
/// async fn main() -> TelemetryResult<()> {
///     let cache = NodeTelemetryCache::builder()
///         .config(CollectorConfig::from_file("collector.json").await?)
///         .build()?;
///
///     cache.add_node(1, "k8s-master", "10.0.0.1/24", "192.168.56.101").await?;
///     cache.start().await?;
///
///     let report = cache.collect_now().await?;
///     for finding in &report.findings {
///         println!("{}", finding);
///     }
///
///     cache.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct NodeTelemetryCache {
    config: Arc<CollectorConfig>,
    store: Arc<NodeStore>,
    engine: Arc<ValidationEngine>,
    fetcher: Arc<FetchService>,
    ingest: IngestService,
    coordinator: Mutex<Option<CoordinatorHandle>>,
}

/// Builder for NodeTelemetryCache configuration
#[derive(Default)]
pub struct NodeTelemetryCacheBuilder {
    config: Option<CollectorConfig>,
    rules: Vec<Box<dyn ValidationRule>>,
    watchers: Vec<Arc<dyn ResyncWatcher>>,
}

impl NodeTelemetryCacheBuilder {
    pub fn config(mut self, config: CollectorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Adds a validation rule run after the built-in loopback and ARP rules.
    pub fn rule(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn watcher(mut self, watcher: Arc<dyn ResyncWatcher>) -> Self {
        self.watchers.push(watcher);
        self
    }

    /// Validates the configuration and assembles the cache. No task is
    /// spawned until [`NodeTelemetryCache::start`].
    pub fn build(self) -> TelemetryResult<NodeTelemetryCache> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let config = Arc::new(config);

        let mut engine = ValidationEngine::with_default_rules(&config.loopback_interface);
        for rule in self.rules {
            engine.add_rule(rule);
        }

        let store = Arc::new(NodeStore::with_loopback_interface(
            config.loopback_interface.clone(),
        ));
        let client = AgentClient::new(Arc::clone(&config))?;

        Ok(NodeTelemetryCache {
            fetcher: Arc::new(FetchService::new(Arc::new(client))),
            ingest: IngestService::new(Arc::clone(&store), self.watchers),
            engine: Arc::new(engine),
            store,
            config,
            coordinator: Mutex::new(None),
        })
    }
}

impl NodeTelemetryCache {
    /// Creates a new builder for NodeTelemetryCache configuration
    pub fn builder() -> NodeTelemetryCacheBuilder {
        NodeTelemetryCacheBuilder::default()
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Inserts a new node record.
    ///
    /// # Errors
    ///
    /// - `DuplicateNode` if a node with that name exists
    /// - `Validation` if the name or management address is malformed
    pub async fn add_node(
        &self,
        id: u32,
        name: &str,
        ip_address: &str,
        management_ip_address: &str,
    ) -> TelemetryResult<()> {
        self.store
            .add_node(id, name, ip_address, management_ip_address)
            .await
    }

    /// Removes the named nodes. Unknown names are ignored.
    pub async fn delete_nodes<S: AsRef<str>>(&self, names: &[S]) {
        self.store.delete_nodes(names).await
    }

    /// Returns a copy of the named node record.
    ///
    /// # Errors
    ///
    /// `NotFound` if no node has that name.
    pub async fn get_node(&self, name: &str) -> TelemetryResult<Node> {
        self.store.get_node(name).await
    }

    /// Returns the records for every name that exists, in request order.
    pub async fn lookup_node<S: AsRef<str>>(&self, names: &[S]) -> Vec<Node> {
        self.store.lookup_nodes(names).await
    }

    /// Returns every node record, sorted by name.
    pub async fn list_all_nodes(&self) -> Vec<Node> {
        self.store.get_all_nodes().await
    }

    /// Returns the report log: fetch failures and validation findings in the
    /// order they were recorded.
    pub async fn report(&self) -> Vec<String> {
        self.store.report().await
    }

    /// Drops every node record. The report log is kept.
    pub async fn clear_cache(&self) {
        self.store.clear_cache().await
    }

    /// Runs every validation rule over the current records and appends the
    /// findings to the report log.
    pub async fn validate(&self) -> Vec<Finding> {
        self.store.run_validation(&self.engine).await
    }

    /// Runs only the loopback address rule. Returns the number of findings
    /// appended to the report log.
    pub async fn validate_loop_if_addresses(&self) -> usize {
        self.store.validate_loop_if_addresses().await
    }

    /// Replaces one category of an existing node and rebuilds its lookup
    /// maps, for hosts that obtain payloads outside a collection cycle.
    ///
    /// # Errors
    ///
    /// `NotFound` if the node is absent; the node is not created.
    pub async fn apply_payload(&self, name: &str, payload: CategoryPayload) -> TelemetryResult<()> {
        self.store.apply_payload(name, payload).await?;
        self.store.populate_node_maps(name).await
    }

    /// Applies one membership change.
    ///
    /// # Errors
    ///
    /// `Validation` if a `Put` carries a malformed name or address.
    pub async fn update(&self, event: ChangeEvent) -> TelemetryResult<()> {
        self.ingest.update(event).await
    }

    /// Replaces the node set, notifies the resync watchers and, when the
    /// coordinator is running, requests a collection cycle.
    ///
    /// # Errors
    ///
    /// - `DuplicateNode` or `Validation` if the incoming set is rejected; the
    ///   store is left unchanged
    /// - the first watcher failure, after every watcher has been notified
    pub async fn resync(&self, event: ResyncEvent) -> TelemetryResult<()> {
        let result = self.ingest.resync(event).await;
        if let Some(requester) = self.requester().await {
            requester.trigger();
        }
        result
    }

    /// Starts periodic collection.
    ///
    /// # Errors
    ///
    /// `Coordinator` if collection is already running.
    pub async fn start(&self) -> TelemetryResult<()> {
        let mut coordinator = self.coordinator.lock().await;
        if coordinator.is_some() {
            return Err(TelemetryError::Coordinator(
                "collection coordinator is already running".to_string(),
            ));
        }

        let service = CoordinatorService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.engine),
            Arc::clone(&self.config),
        );
        *coordinator = Some(service.start());
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.coordinator.lock().await.is_some()
    }

    /// Runs a collection cycle now and waits for its report. A cycle already
    /// in flight finishes first.
    ///
    /// # Errors
    ///
    /// `Coordinator` if collection is not running.
    pub async fn collect_now(&self) -> TelemetryResult<CycleReport> {
        let requester = self.requester().await.ok_or_else(|| {
            TelemetryError::Coordinator("collection coordinator is not running".to_string())
        })?;
        requester.collect_now().await
    }

    /// Requests a collection cycle without waiting for it. Returns `false` if
    /// collection is not running or enough cycles are already queued.
    pub async fn trigger(&self) -> bool {
        match self.requester().await {
            Some(requester) => requester.trigger(),
            None => false,
        }
    }

    /// Stops collection after any in-flight cycle. Stored records are kept,
    /// and [`start`](Self::start) may be called again.
    pub async fn shutdown(&self) {
        let handle = self.coordinator.lock().await.take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
    }

    async fn requester(&self) -> Option<CycleRequester> {
        self.coordinator
            .lock()
            .await
            .as_ref()
            .map(CoordinatorHandle::requester)
    }
}
