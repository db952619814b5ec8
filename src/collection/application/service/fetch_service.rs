use crate::core::{
    domain::{
        error::{TelemetryError, TelemetryResult},
        model::{
            category::{Category, CategoryPayload},
            node_bridge_domain::NodeBridgeDomain,
            node_interface::NodeInterface,
            node_ip_arp::NodeIpArp,
            node_l2fib::NodeL2Fib,
            node_liveness::NodeLiveness,
        },
    },
    infrastructure::agent_client::AgentClient,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Stateless fetch-and-decode of one category from one node agent.
#[derive(Debug, Clone)]
pub struct FetchService {
    client: Arc<AgentClient>,
}

impl FetchService {
    pub fn new(client: Arc<AgentClient>) -> Self {
        Self { client }
    }

    /// Fetches `category` from the agent at `management_address` and tags the
    /// decoded payload with its category.
    ///
    /// # Errors
    /// `Transport` or `Decode` from the agent client, or `Unsupported` for the
    /// telemetry category.
    pub async fn execute(
        &self,
        management_address: &str,
        category: Category,
    ) -> TelemetryResult<CategoryPayload> {
        let client = &self.client;
        match category {
            Category::Liveness => client
                .get::<NodeLiveness>(management_address, category)
                .await
                .map(CategoryPayload::Liveness),
            Category::Interfaces => client
                .get::<HashMap<u32, NodeInterface>>(management_address, category)
                .await
                .map(CategoryPayload::Interfaces),
            Category::BridgeDomains => client
                .get::<HashMap<u32, NodeBridgeDomain>>(management_address, category)
                .await
                .map(CategoryPayload::BridgeDomains),
            Category::L2Fibs => client
                .get::<HashMap<String, NodeL2Fib>>(management_address, category)
                .await
                .map(CategoryPayload::L2Fibs),
            Category::IpArps => client
                .get::<Vec<NodeIpArp>>(management_address, category)
                .await
                .map(CategoryPayload::IpArps),
            Category::Telemetry => Err(TelemetryError::Unsupported(Category::Telemetry)),
        }
    }
}
