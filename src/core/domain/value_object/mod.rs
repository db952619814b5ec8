mod agent_port;
mod interface_address;
mod node_name;
pub(crate) mod serde_helpers;

pub use agent_port::AgentPort;
pub use interface_address::InterfaceAddress;

// Re-export validation functions for internal use
pub(crate) use agent_port::validate_port;
pub(crate) use interface_address::validate_interface_address;
pub(crate) use node_name::{host_literal, validate_management_address, validate_node_name};
