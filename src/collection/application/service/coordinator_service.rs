//! Collection cycles.
//!
//! A trigger loop owns the schedule. Each cycle snapshots the node list, fans
//! out one fetch task per (node, enabled category) and waits for the
//! aggregation loop to close the cycle before the next one may begin.
//!
//! The aggregation loop is the only task that commits fetched payloads. It
//! buffers every message of the cycle, and once exactly `nodes x categories`
//! messages have arrived it hands the successful payloads to the store in one
//! commit, which rebuilds the lookup maps of the touched nodes and runs
//! validation under a single write lock. The trigger loop is then answered
//! with a [`CycleReport`].

use crate::collection::application::response::{
    cycle_report::CycleReport, fetch_result::FetchResult,
};
use crate::collection::application::service::fetch_service::FetchService;
use crate::core::{
    domain::{
        error::{TelemetryError, TelemetryResult},
        model::{category::Category, collector_config::CollectorConfig},
    },
    infrastructure::node_store::{CycleCommit, NodeStore},
};
use crate::validation::application::service::validation_engine::ValidationEngine;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Queued trigger requests beyond this are dropped; a cycle is already pending.
const TRIGGER_QUEUE: usize = 4;

/// Messages consumed by the aggregation loop.
#[derive(Debug)]
pub(crate) enum CycleMessage {
    /// Opens a cycle. Sent before any fetch of that cycle is spawned.
    Begin {
        cycle: u64,
        nodes: usize,
        expected: usize,
        done: oneshot::Sender<CycleReport>,
    },
    Fetched(FetchResult),
}

struct TriggerRequest {
    reply: Option<oneshot::Sender<TelemetryResult<CycleReport>>>,
}

fn stopped() -> TelemetryError {
    TelemetryError::Coordinator("collection coordinator is not running".to_string())
}

/// Drives periodic and on-demand collection cycles over a [`NodeStore`].
pub struct CoordinatorService {
    store: Arc<NodeStore>,
    fetcher: Arc<FetchService>,
    engine: Arc<ValidationEngine>,
    config: Arc<CollectorConfig>,
}

impl CoordinatorService {
    pub fn new(
        store: Arc<NodeStore>,
        fetcher: Arc<FetchService>,
        engine: Arc<ValidationEngine>,
        config: Arc<CollectorConfig>,
    ) -> Self {
        Self {
            store,
            fetcher,
            engine,
            config,
        }
    }

    /// Spawns the trigger and aggregation loops.
    ///
    /// The first periodic cycle fires one `collection_period` after start;
    /// [`CycleRequester::collect_now`] runs one immediately.
    pub fn start(self) -> CoordinatorHandle {
        let (cycle_tx, cycle_rx) = mpsc::channel(self.config.channel_capacity);
        let (request_tx, request_rx) = mpsc::channel(TRIGGER_QUEUE);
        let (stop_tx, stop_rx) = oneshot::channel();

        let aggregator = Aggregator {
            store: Arc::clone(&self.store),
            engine: Arc::clone(&self.engine),
            open: None,
        };
        let aggregation = tokio::spawn(aggregator.run(cycle_rx));
        let trigger = tokio::spawn(self.trigger_loop(request_rx, stop_rx, cycle_tx));

        info!("collection coordinator started");
        CoordinatorHandle {
            requester: CycleRequester { requests: request_tx },
            stop: stop_tx,
            trigger,
            aggregation,
        }
    }

    async fn trigger_loop(
        self,
        mut requests: mpsc::Receiver<TriggerRequest>,
        mut stop: oneshot::Receiver<()>,
        cycles: mpsc::Sender<CycleMessage>,
    ) {
        let period = self.config.collection_period;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut next_cycle: u64 = 1;

        loop {
            let reply = tokio::select! {
                _ = &mut stop => break,
                _ = ticker.tick() => None,
                request = requests.recv() => match request {
                    Some(request) => request.reply,
                    None => break,
                },
            };

            let cycle = next_cycle;
            next_cycle += 1;
            let result = self.run_cycle(cycle, &cycles).await;

            match reply {
                Some(reply) => {
                    if reply.send(result).is_err() {
                        debug!(cycle, "cycle requester went away before the report");
                    }
                }
                None => {
                    if let Err(e) = result {
                        error!(cycle, error = %e, "collection cycle failed");
                    }
                }
            }
        }

        debug!("collection trigger loop stopped");
    }

    async fn run_cycle(
        &self,
        cycle: u64,
        cycles: &mpsc::Sender<CycleMessage>,
    ) -> TelemetryResult<CycleReport> {
        let nodes = self.store.get_all_nodes().await;
        let categories = self.config.enabled_categories.clone();
        let expected = nodes.len() * categories.len();
        info!(cycle, nodes = nodes.len(), expected, "collection cycle started");

        let (done_tx, done_rx) = oneshot::channel();
        cycles
            .send(CycleMessage::Begin {
                cycle,
                nodes: nodes.len(),
                expected,
                done: done_tx,
            })
            .await
            .map_err(|_| stopped())?;

        let mut tasks = JoinSet::new();
        let mut spawned: HashMap<tokio::task::Id, (String, Category)> = HashMap::new();
        for node in &nodes {
            for &category in &categories {
                let fetcher = Arc::clone(&self.fetcher);
                let sender = cycles.clone();
                let node_name = node.name.clone();
                let address = node.management_ip_address.clone();
                let handle = tasks.spawn(async move {
                    let outcome = fetcher.execute(&address, category).await;
                    let message = CycleMessage::Fetched(FetchResult {
                        cycle,
                        node_name,
                        category,
                        outcome,
                    });
                    if sender.send(message).await.is_err() {
                        debug!(cycle, "aggregation loop closed, fetch result discarded");
                    }
                });
                spawned.insert(handle.id(), (node.name.clone(), category));
            }
        }

        // A task that dies without sending would hold the barrier open forever,
        // so its slot is filled with a failure in its place.
        while let Some(joined) = tasks.join_next().await {
            let Err(join_error) = joined else { continue };
            let Some((node_name, category)) = spawned.remove(&join_error.id()) else {
                continue;
            };
            error!(cycle, node = %node_name, %category, error = %join_error, "fetch task failed");
            let message = CycleMessage::Fetched(FetchResult {
                cycle,
                node_name,
                category,
                outcome: Err(TelemetryError::Coordinator(format!(
                    "fetch task failed: {}",
                    join_error
                ))),
            });
            cycles.send(message).await.map_err(|_| stopped())?;
        }

        done_rx.await.map_err(|_| stopped())
    }
}

struct OpenCycle {
    cycle: u64,
    nodes: usize,
    expected: usize,
    results: Vec<FetchResult>,
    done: oneshot::Sender<CycleReport>,
}

struct Aggregator {
    store: Arc<NodeStore>,
    engine: Arc<ValidationEngine>,
    open: Option<OpenCycle>,
}

impl Aggregator {
    async fn run(mut self, mut messages: mpsc::Receiver<CycleMessage>) {
        while let Some(message) = messages.recv().await {
            match message {
                CycleMessage::Begin {
                    cycle,
                    nodes,
                    expected,
                    done,
                } => {
                    if let Some(stale) = self.open.take() {
                        warn!(
                            cycle = stale.cycle,
                            received = stale.results.len(),
                            expected = stale.expected,
                            "abandoning incomplete collection cycle"
                        );
                    }
                    let open = OpenCycle {
                        cycle,
                        nodes,
                        expected,
                        results: Vec::with_capacity(expected),
                        done,
                    };
                    if expected == 0 {
                        self.commit(open).await;
                    } else {
                        self.open = Some(open);
                    }
                }
                CycleMessage::Fetched(result) => self.receive(result).await,
            }
        }
        debug!("aggregation loop stopped");
    }

    async fn receive(&mut self, result: FetchResult) {
        let Some(open) = self.open.as_mut() else {
            warn!(cycle = result.cycle, node = %result.node_name, "fetch result outside a cycle dropped");
            return;
        };
        if open.cycle != result.cycle {
            warn!(
                cycle = result.cycle,
                open = open.cycle,
                node = %result.node_name,
                "fetch result for another cycle dropped"
            );
            return;
        }

        if let Err(e) = &result.outcome {
            warn!(node = %result.node_name, category = %result.category, error = %e, "fetch failed");
            self.store
                .append_report(format!(
                    "node {} category error: {}: {}",
                    result.node_name, result.category, e
                ))
                .await;
        }

        open.results.push(result);
        if open.results.len() == open.expected {
            if let Some(open) = self.open.take() {
                self.commit(open).await;
            }
        }
    }

    async fn commit(&self, open: OpenCycle) {
        let received = open.results.len();
        let mut failures = 0;
        let mut payloads = Vec::with_capacity(received);

        for result in open.results {
            match result.outcome {
                Ok(payload) => payloads.push((result.node_name, payload)),
                Err(_) => failures += 1,
            }
        }

        let CycleCommit {
            committed,
            dropped,
            findings,
        } = self.store.commit_cycle(payloads, &self.engine).await;
        info!(
            cycle = open.cycle,
            received,
            committed,
            failures,
            findings = findings.len(),
            "collection cycle committed"
        );

        let report = CycleReport {
            cycle: open.cycle,
            nodes: open.nodes,
            expected: open.expected,
            received,
            committed,
            failures,
            dropped,
            findings,
        };
        if open.done.send(report).is_err() {
            debug!(cycle = open.cycle, "cycle trigger went away before commit");
        }
    }
}

/// Cloneable entry point for requesting cycles from a running coordinator.
#[derive(Clone)]
pub struct CycleRequester {
    requests: mpsc::Sender<TriggerRequest>,
}

impl CycleRequester {
    /// Runs a cycle as soon as the current one (if any) completes and waits
    /// for its report.
    ///
    /// # Errors
    /// `Coordinator` if the coordinator has shut down, or the failure that
    /// stopped the cycle.
    pub async fn collect_now(&self) -> TelemetryResult<CycleReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(TriggerRequest {
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| stopped())?;
        reply_rx.await.map_err(|_| stopped())?
    }

    /// Requests a cycle without waiting. Returns `false` when the request
    /// was not queued because enough cycles are already pending.
    pub fn trigger(&self) -> bool {
        match self.requests.try_send(TriggerRequest { reply: None }) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "cycle trigger not queued");
                false
            }
        }
    }
}

/// Handle to a running coordinator.
pub struct CoordinatorHandle {
    requester: CycleRequester,
    stop: oneshot::Sender<()>,
    trigger: JoinHandle<()>,
    aggregation: JoinHandle<()>,
}

impl CoordinatorHandle {
    pub fn requester(&self) -> CycleRequester {
        self.requester.clone()
    }

    /// Stops scheduling, lets an in-flight cycle finish and waits for both
    /// loops to exit. Requesters cloned from this handle fail afterwards.
    pub async fn shutdown(self) {
        // Err only if the trigger loop already exited.
        let _ = self.stop.send(());
        drop(self.requester);
        if let Err(e) = self.trigger.await {
            error!(error = %e, "collection trigger loop panicked");
        }
        if let Err(e) = self.aggregation.await {
            error!(error = %e, "aggregation loop panicked");
        }
        info!("collection coordinator stopped");
    }
}
