use crate::core::{
    domain::{
        error::{TelemetryError, TelemetryResult},
        model::{
            change_event::{ChangeEvent, ResyncEvent},
            node::Node,
        },
    },
    infrastructure::node_store::NodeStore,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Receives the node set after every resync.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResyncWatcher: Send + Sync {
    /// Called with the node records as they stand right after the resync.
    ///
    /// # Errors
    /// Any error is handed back to the caller of the resync.
    async fn on_resync(&self, nodes: &[Node]) -> TelemetryResult<()>;
}

/// Applies membership events from the external watch subsystem to the store.
pub struct IngestService {
    store: Arc<NodeStore>,
    watchers: Vec<Arc<dyn ResyncWatcher>>,
}

impl IngestService {
    pub fn new(store: Arc<NodeStore>, watchers: Vec<Arc<dyn ResyncWatcher>>) -> Self {
        Self { store, watchers }
    }

    /// Applies one incremental change.
    ///
    /// # Errors
    /// Validation errors from the store for a malformed `Put`.
    pub async fn update(&self, event: ChangeEvent) -> TelemetryResult<()> {
        match event {
            ChangeEvent::Put(info) => {
                debug!(node = %info.name, "membership put");
                self.store.upsert_node(info).await
            }
            ChangeEvent::Delete { name } => {
                debug!(node = %name, "membership delete");
                self.store.delete_nodes(&[name]).await;
                Ok(())
            }
        }
    }

    /// Replaces the node set and notifies every watcher.
    ///
    /// All watchers are notified even when one fails; the first failure is
    /// returned.
    ///
    /// # Errors
    /// Store validation errors (the store is then unchanged) or the first
    /// watcher failure.
    pub async fn resync(&self, event: ResyncEvent) -> TelemetryResult<()> {
        self.store.replace_nodes(event.nodes).await?;
        let nodes = self.store.get_all_nodes().await;
        info!(nodes = nodes.len(), watchers = self.watchers.len(), "resync applied");

        let mut first_error: Option<TelemetryError> = None;
        for watcher in &self.watchers {
            if let Err(e) = watcher.on_resync(&nodes).await {
                warn!(error = %e, "resync watcher failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
