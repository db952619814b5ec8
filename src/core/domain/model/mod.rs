pub mod category;
pub mod change_event;
pub mod collector_config;
pub mod finding;
pub mod node;
pub mod node_bridge_domain;
pub mod node_interface;
pub mod node_ip_arp;
pub mod node_l2fib;
pub mod node_liveness;
pub mod node_telemetry;
