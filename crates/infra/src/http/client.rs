use std::time::Duration;

use aura_domain::{AuraError, LlmConfig};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("aura-calendar/", env!("CARGO_PKG_VERSION"));

/// When and how long to wait between attempts at a language-model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: usize,
    pub base_backoff: Duration,
    /// Upper bound for any single wait, including a server's `Retry-After`.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `retry` (1-based), doubling each time.
    pub fn backoff(&self, retry: usize) -> Duration {
        let shift = u32::try_from(retry.saturating_sub(1).min(8)).unwrap_or(8);
        self.base_backoff.saturating_mul(1u32 << shift).min(self.max_backoff)
    }

    /// Wait requested by the server, bounded by `max_backoff`.
    fn server_hint(&self, response: &Response) -> Option<Duration> {
        response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs).min(self.max_backoff))
    }
}

/// Outbound HTTP for the remote collaborators.
///
/// Rate limiting (429), server errors and transport failures are retried;
/// the response of the last attempt is returned as-is so callers can map
/// its status.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    policy: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client using the timeout and attempt budget of the LLM section.
    pub fn from_config(config: &LlmConfig) -> Result<Self, AuraError> {
        Self::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_attempts(config.max_attempts)
            .build()
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send the request, retrying per the client's [`RetryPolicy`].
    ///
    /// # Errors
    /// `AuraError::Network` when the last attempt fails in transport, and
    /// `AuraError::Internal` when the body cannot be replayed.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, AuraError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| AuraError::Internal("streaming request bodies cannot be retried".into()))?
                .build()
                .map_err(|err| AuraError::from(InfraError::from(err)))?;
            let url = request.url().clone();
            let last = attempt >= attempts;

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %url, %status, "llm endpoint responded");

                    if last || !is_retryable_status(status) {
                        return Ok(response);
                    }
                    let wait = if status == StatusCode::TOO_MANY_REQUESTS {
                        self.policy.server_hint(&response)
                    } else {
                        None
                    };
                    let wait = wait.unwrap_or_else(|| self.policy.backoff(attempt));
                    warn!(attempt, %status, wait_ms = wait.as_millis() as u64, "retrying llm call");
                    pause(wait).await;
                }
                Err(err) => {
                    if last || !is_retryable_error(&err) {
                        return Err(AuraError::from(InfraError::from(err)));
                    }
                    let wait = self.policy.backoff(attempt);
                    warn!(attempt, %url, error = %err, "llm call failed in transport; retrying");
                    pause(wait).await;
                }
            }

            attempt += 1;
        }
    }
}

async fn pause(wait: Duration) {
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    policy: RetryPolicy,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), policy: RetryPolicy::default() }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts, the first one included. Zero is treated as one.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.policy.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.policy.base_backoff = backoff;
        self
    }

    pub fn max_backoff(mut self, cap: Duration) -> Self {
        self.policy.max_backoff = cap;
        self
    }

    pub fn build(self) -> Result<HttpClient, AuraError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| AuraError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, policy: self.policy })
    }
}
