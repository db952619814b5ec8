pub(crate) mod agent_client;
pub(crate) mod node_store;
