//! Collector configuration consumed when the cache is built.

use crate::core::domain::{
    error::{TelemetryError, TelemetryResult, ValidationError},
    model::category::Category,
    value_object::{AgentPort, serde_helpers, validate_port},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Dataplane internal name of the node loopback interface.
pub const DEFAULT_LOOPBACK_INTERFACE: &str = "loop0";

/// Where a category is served on each node agent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AgentEndpoint {
    #[serde(default)]
    pub port: AgentPort,
    pub path: String,
    /// Overrides [`CollectorConfig::fetch_timeout`] for this category.
    #[serde(
        default,
        with = "serde_helpers::option_duration_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

impl AgentEndpoint {
    pub fn for_category(category: Category) -> Self {
        Self {
            port: AgentPort::DEFAULT,
            path: category.default_path().to_string(),
            timeout: None,
        }
    }
}

/// Outbound fetch throttle shared by all fetch tasks.
///
/// Time spent waiting for a permit counts against the fetch timeout, so a
/// fetch throttled past its timeout fails like a hung agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

/// Recognized collector options and their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Time between periodic collection cycles.
    #[serde(with = "serde_helpers::duration_secs")]
    pub collection_period: Duration,
    /// Hard timeout of a single agent fetch.
    #[serde(with = "serde_helpers::duration_secs")]
    pub fetch_timeout: Duration,
    /// Per-category agent endpoints. Missing categories use their defaults.
    pub endpoints: BTreeMap<Category, AgentEndpoint>,
    /// Categories fetched each cycle.
    pub enabled_categories: Vec<Category>,
    /// Interface checked by the loopback address rule.
    pub loopback_interface: String,
    pub rate_limit: Option<RateLimitConfig>,
    /// Capacity of the fetch completion channel.
    pub channel_capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            collection_period: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(100),
            endpoints: Category::ALL
                .into_iter()
                .map(|c| (c, AgentEndpoint::for_category(c)))
                .collect(),
            enabled_categories: Category::SUPPORTED.to_vec(),
            loopback_interface: DEFAULT_LOOPBACK_INTERFACE.to_string(),
            rate_limit: None,
            channel_capacity: 256,
        }
    }
}

impl CollectorConfig {
    /// Parses a JSON document and validates it.
    pub fn from_json_str(json: &str) -> TelemetryResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            TelemetryError::from(ValidationError::Format(format!(
                "Invalid collector configuration: {}",
                e
            )))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file and validates it.
    pub async fn from_file(path: impl AsRef<Path>) -> TelemetryResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            TelemetryError::from(ValidationError::Field {
                field: "config".to_string(),
                message: format!("Cannot read {}: {}", path.display(), e),
            })
        })?;
        Self::from_json_str(&text)
    }

    /// Endpoint for a category, falling back to the default port and path.
    pub fn endpoint(&self, category: Category) -> AgentEndpoint {
        self.endpoints
            .get(&category)
            .cloned()
            .unwrap_or_else(|| AgentEndpoint::for_category(category))
    }

    /// Timeout applied to fetches of a category.
    pub fn timeout_for(&self, category: Category) -> Duration {
        self.endpoints
            .get(&category)
            .and_then(|e| e.timeout)
            .unwrap_or(self.fetch_timeout)
    }

    pub fn validate(&self) -> TelemetryResult<()> {
        if self.enabled_categories.is_empty() {
            return Err(ValidationError::Field {
                field: "enabled_categories".to_string(),
                message: "At least one category must be enabled".to_string(),
            }
            .into());
        }

        let mut seen = Vec::with_capacity(self.enabled_categories.len());
        for category in &self.enabled_categories {
            if !category.is_supported() {
                return Err(TelemetryError::Unsupported(*category));
            }
            if seen.contains(category) {
                return Err(ValidationError::ConstraintViolation(format!(
                    "Category '{}' is enabled twice",
                    category
                ))
                .into());
            }
            seen.push(*category);
        }

        for (category, endpoint) in &self.endpoints {
            validate_port(endpoint.port.get())?;
            if !endpoint.path.starts_with('/') {
                return Err(ValidationError::Field {
                    field: format!("endpoints.{}.path", category),
                    message: "Path must start with '/'".to_string(),
                }
                .into());
            }
            if endpoint.timeout == Some(Duration::ZERO) {
                return Err(ValidationError::Field {
                    field: format!("endpoints.{}.timeout", category),
                    message: "Timeout cannot be 0".to_string(),
                }
                .into());
            }
        }

        for (field, value) in [
            ("collection_period", self.collection_period),
            ("fetch_timeout", self.fetch_timeout),
        ] {
            if value.is_zero() {
                return Err(ValidationError::Field {
                    field: field.to_string(),
                    message: "Duration cannot be 0".to_string(),
                }
                .into());
            }
        }

        if self.loopback_interface.is_empty() {
            return Err(ValidationError::Field {
                field: "loopback_interface".to_string(),
                message: "Loopback interface name cannot be empty".to_string(),
            }
            .into());
        }

        if self.channel_capacity == 0 {
            return Err(ValidationError::Field {
                field: "channel_capacity".to_string(),
                message: "Channel capacity cannot be 0".to_string(),
            }
            .into());
        }

        if let Some(rl) = self.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                return Err(ValidationError::ConstraintViolation(
                    "Rate limit values must be greater than 0".to_string(),
                )
                .into());
            }
        }

        Ok(())
    }
}
