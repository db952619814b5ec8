pub mod arp_rule;
pub mod loopback_rule;
pub mod validation_engine;
