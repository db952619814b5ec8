//! Domain model for the `/liveness` agent endpoint.

use serde::{Deserialize, Serialize};

/// Liveness record reported by a node's dataplane agent.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct NodeLiveness {
    /// Agent build version.
    #[serde(default)]
    pub build_version: String,
    /// Agent build date.
    #[serde(default)]
    pub build_date: String,
    /// Agent state code (1 = OK).
    #[serde(default)]
    pub state: u32,
    /// Agent start time, seconds since UNIX epoch.
    #[serde(default)]
    pub start_time: u64,
    /// Last state change, seconds since UNIX epoch.
    #[serde(default)]
    pub last_change: u64,
    /// Last status update, seconds since UNIX epoch.
    #[serde(default)]
    pub last_update: u64,
    #[serde(default)]
    pub commit_hash: String,
}
