use crate::core::domain::model::finding::Finding;

/// Summary of one completed collection cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CycleReport {
    pub cycle: u64,
    /// Nodes targeted at cycle start.
    pub nodes: usize,
    /// Messages the barrier waited for: nodes x enabled categories.
    pub expected: usize,
    /// Messages received before commit. Always equals `expected`.
    pub received: usize,
    /// Payloads written to the store.
    pub committed: usize,
    /// Fetches that failed with a transport or decode error.
    pub failures: usize,
    /// Payloads dropped because their node left the store mid-cycle.
    pub dropped: usize,
    /// Findings produced by the validation run that closed the cycle.
    pub findings: Vec<Finding>,
}
