//! HTTP client for the provider's GraphQL endpoint
//!
//! Requests share one pooled `reqwest` client, wait on a direct rate limiter
//! before every attempt, and retry transport failures with exponential
//! backoff.

use crate::transport::{GraphQlRequest, GraphQlResponse, QueryTransport};
use async_trait::async_trait;
use footfall_common::{ApiKey, FootfallError, Result};
use footfall_config::ProviderConfig;
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, error, instrument, warn};

/// Header carrying the credential.
const API_KEY_HEADER: &str = "apikey";

/// GraphQL client with connection pooling, rate limiting and retries
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: Client,
    config: ProviderConfig,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl ProviderClient {
    /// Create a new client from the provider section of the configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| FootfallError::transport_with_source("Failed to create HTTP client", e))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_per_sec)
                .ok_or_else(|| FootfallError::config("Rate limit must be greater than 0"))?,
        );
        let rate_limiter = Arc::new(DefaultDirectRateLimiter::direct(quota));

        Ok(Self {
            client,
            config: config.clone(),
            rate_limiter,
        })
    }

    /// One attempt: send the request and classify the outcome
    async fn send_once(&self, credential: &ApiKey, request: &GraphQlRequest) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .post(&self.config.url)
            .header(API_KEY_HEADER, credential.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!("Request to provider failed: {}", e);
                FootfallError::from(e)
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!("Provider rejected the credential: {}", status);
            return Err(FootfallError::auth_with_status(
                format!("Provider rejected the API key: {status}"),
                status.as_u16(),
            ));
        }
        if status.is_client_error() {
            error!("Client error: {}", status);
            return Err(FootfallError::transport_with_status(
                format!("Provider returned client error: {status}"),
                status.as_u16(),
            ));
        }
        if !status.is_success() {
            warn!("Server error, will retry: {}", status);
            return Err(FootfallError::transport_with_status(
                format!("Provider returned server error: {status}"),
                status.as_u16(),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FootfallError::transport_with_source("Failed to read response body", e))?;

        let body: GraphQlResponse = serde_json::from_str(&text).map_err(|e| {
            FootfallError::malformed_with_source("Response body is not a GraphQL response", "$", e)
        })?;

        body.into_data()
    }

    /// Get metrics about the client configuration and state
    pub fn get_client_metrics(&self) -> ClientMetrics {
        ClientMetrics {
            url: self.config.url.clone(),
            timeout_secs: self.config.timeout_secs,
            max_idle_per_host: self.config.max_idle_per_host,
            rate_limit_per_sec: self.config.rate_limit_per_sec,
            max_retries: self.config.max_retries,
        }
    }
}

#[async_trait]
impl QueryTransport for ProviderClient {
    #[instrument(skip(self, credential, request), fields(operation = %request.operation_name))]
    async fn execute(&self, credential: &ApiKey, request: &GraphQlRequest) -> Result<Value> {
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(10))
            .take(self.config.max_retries);

        let data = RetryIf::start(
            retry_strategy,
            || self.send_once(credential, request),
            FootfallError::is_retryable,
        )
        .await?;

        debug!("Request {} completed", request.operation_name);
        Ok(data)
    }
}

/// Client metrics for monitoring and debugging
#[derive(Debug, Clone, Serialize)]
pub struct ClientMetrics {
    /// Endpoint being used
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection pool max idle per host
    pub max_idle_per_host: usize,
    /// Rate limit requests per second
    pub rate_limit_per_sec: u32,
    /// Maximum retry attempts
    pub max_retries: usize,
}
