//! Internal HTTP client that fetches category payloads from node agents.

use crate::core::domain::{
    error::{TelemetryError, TelemetryResult, ValidationError},
    model::{category::Category, collector_config::CollectorConfig},
    value_object::host_literal,
};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Internal HTTP client shared by every fetch task.
///
/// Each fetch is bounded by the per-category timeout from the configuration,
/// including any wait on the rate limiter. When a rate limit is configured,
/// all fetch tasks draw from one limiter.
#[derive(Debug)]
pub struct AgentClient {
    http_client: Client,
    config: Arc<CollectorConfig>,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl AgentClient {
    /// Creates a new `AgentClient`.
    ///
    /// # Errors
    /// Returns `TelemetryError::Transport` if the HTTP client cannot be built,
    /// or a validation error if the rate limit contains a zero value.
    pub fn new(config: Arc<CollectorConfig>) -> TelemetryResult<Self> {
        let http_client = Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| TelemetryError::Transport(e.to_string()))?;

        let rate_limiter = match config.rate_limit {
            Some(rl) => {
                let per_second = NonZeroU32::new(rl.requests_per_second)
                    .ok_or_else(|| zero_rate_limit("requests_per_second"))?;
                let burst = NonZeroU32::new(rl.burst_size)
                    .ok_or_else(|| zero_rate_limit("burst_size"))?;
                let quota = Quota::per_second(per_second).allow_burst(burst);
                Some(Arc::new(DefaultDirectRateLimiter::direct(quota)))
            }
            None => None,
        };

        Ok(Self {
            http_client,
            config,
            rate_limiter,
        })
    }

    /// Builds the agent URL serving `category` on the node at `management_address`.
    pub fn endpoint_url(&self, management_address: &str, category: Category) -> TelemetryResult<Url> {
        let endpoint = self.config.endpoint(category);
        let base = format!(
            "http://{}:{}",
            host_literal(management_address),
            endpoint.port.get()
        );
        Url::parse(&base)
            .and_then(|url| url.join(&endpoint.path))
            .map_err(|e| {
                TelemetryError::Transport(format!(
                    "invalid agent url for '{}': {}",
                    management_address, e
                ))
            })
    }

    /// Performs a GET against the agent and decodes the JSON body.
    ///
    /// The per-category timeout covers the whole fetch: waiting for the rate
    /// limiter, sending the request and reading the body.
    ///
    /// # Type Parameters
    /// - `T`: The expected payload type (must implement `DeserializeOwned`).
    ///
    /// # Errors
    /// Returns `TelemetryError::Transport` on connection failure, timeout or a
    /// non-2xx status, and `TelemetryError::Decode` if the body does not parse.
    pub async fn get<T>(&self, management_address: &str, category: Category) -> TelemetryResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint_url(management_address, category)?;
        let timeout = self.config.timeout_for(category);

        let body = tokio::time::timeout(timeout, self.fetch_body(&url, timeout))
            .await
            .map_err(|_| TelemetryError::Transport(format!("GET {} timed out", url)))??;

        serde_json::from_str::<T>(&body)
            .map_err(|e| TelemetryError::Decode(format!("{} payload from {}: {}", category, url, e)))
    }

    async fn fetch_body(&self, url: &Url, timeout: Duration) -> TelemetryResult<String> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let response = self
            .http_client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TelemetryError::Transport(format!("GET {} timed out", url))
                } else {
                    TelemetryError::Transport(format!("GET {} failed: {}", url, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Transport(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        response.text().await.map_err(|e| {
            TelemetryError::Transport(format!("reading body of GET {} failed: {}", url, e))
        })
    }
}

fn zero_rate_limit(field: &str) -> TelemetryError {
    ValidationError::Field {
        field: format!("rate_limit.{}", field),
        message: "Rate limit values must be greater than 0".to_string(),
    }
    .into()
}
