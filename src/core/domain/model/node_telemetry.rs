//! Telemetry metrics category.
//!
//! The agent's `/telemetry` response format is not decoded reliably yet, so the
//! value is kept as opaque JSON and the category is never fetched.

use serde::{Deserialize, Serialize};

/// One telemetry metric value, keyed by metric name on the node.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct NodeTelemetry(pub serde_json::Value);
