//! HTTP client for the lookalike server with retry and backoff.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Body of `POST /submit`.
#[derive(Debug, Serialize)]
pub struct SubmitPayload {
    pub content_hash: String,
    pub structural_hash: String,
    pub signature: String,
    pub group_id: String,
    pub user_id: String,
    pub timestamp: i64,
}

/// Classification returned by the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hamming_distance: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
}

/// Retry policy for submissions.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Initial retry interval.
    pub initial_interval: Duration,
    /// Maximum retry interval.
    pub max_interval: Duration,
    /// Give up after this much time spent retrying.
    pub max_elapsed: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(5),
            max_elapsed: Duration::from_secs(30),
        }
    }
}

pub struct LookalikeClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl LookalikeClient {
    pub fn new(base_url: &str, retry: RetryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(retry.timeout)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// Submit a fingerprint, retrying transient failures.
    pub async fn submit(&self, payload: &SubmitPayload) -> Result<SubmitOutcome> {
        let url = format!("{}/submit", self.base_url);
        let url = url.as_str();

        retry_notify(
            self.build_backoff(),
            || async move { self.submit_once(url, payload).await },
            |err: anyhow::Error, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    async fn submit_once(
        &self,
        url: &str,
        payload: &SubmitPayload,
    ) -> std::result::Result<SubmitOutcome, backoff::Error<anyhow::Error>> {
        let start = Instant::now();

        let response = self.client.post(url).json(payload).send().await.map_err(|e| {
            let latency_ms = start.elapsed().as_millis() as u64;
            if is_transient_error(&e) {
                warn!(error = %e, latency_ms, "Transient error, will retry");
                backoff::Error::transient(anyhow!("Request failed: {e}"))
            } else {
                warn!(error = %e, latency_ms, "Permanent error, aborting");
                backoff::Error::permanent(anyhow!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            let detail = match response.json::<ErrorBody>().await {
                Ok(body) => format!("{} {}: {}", status.as_u16(), body.code, body.error),
                Err(_) => status.to_string(),
            };
            return if is_transient_status(status) {
                warn!(status = %status, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(anyhow!("Server unavailable: {detail}")))
            } else {
                Err(backoff::Error::permanent(anyhow!(
                    "Server rejected submission: {detail}"
                )))
            };
        }

        let outcome: SubmitOutcome = response.json().await.map_err(|e| {
            backoff::Error::permanent(anyhow!("Failed to parse server response: {e}"))
        })?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            status = %outcome.status,
            "Submission completed"
        );
        Ok(outcome)
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.retry.initial_interval,
            max_interval: self.retry.max_interval,
            max_elapsed_time: Some(self.retry.max_elapsed),
            ..Default::default()
        }
    }
}

/// Check if a reqwest error is transient and should be retried.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Check if an HTTP status code indicates a transient error.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}
