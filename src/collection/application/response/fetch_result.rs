use crate::core::domain::{
    error::TelemetryResult,
    model::category::{Category, CategoryPayload},
};

/// The single message a fetch task sends for one (node, category) pair.
///
/// The value is immutable once built; the aggregation loop is its only reader.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Cycle the fetch belongs to.
    pub cycle: u64,
    pub node_name: String,
    pub category: Category,
    /// Decoded payload, or the transport/decode failure.
    pub outcome: TelemetryResult<CategoryPayload>,
}

impl FetchResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
