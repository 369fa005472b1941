use crate::error::{FetchError, Result};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "nutrimap/0.2 (+https://github.com/nutrimap/nutrimap)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_BACKOFF_MS: u64 = 500;
/// Upper bound on a single wait between attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Anything that can turn a URL into page markup.
///
/// Only a 200 response counts as success; every other status and every
/// transport failure is a [`FetchError`].
pub trait Fetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// reqwest-backed fetcher with a per-request timeout and bounded retry.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    max_retries: u32,
    base_backoff: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            timeout,
            max_retries: DEFAULT_RETRIES,
            base_backoff: Duration::from_millis(DEFAULT_BACKOFF_MS),
        })
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait before retry number `attempt + 1`: doubles each time, capped at [`MAX_BACKOFF`].
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(MAX_BACKOFF)
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else if e.is_builder() {
                FetchError::InvalidUrl(url.to_string())
            } else {
                FetchError::HttpError(e)
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::HttpError(e)
            }
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let backoff = self.backoff_delay(attempt);
                    attempt += 1;
                    warn!(
                        "Fetch of {} failed ({}), retry {}/{} in {:.1}s",
                        url,
                        e,
                        attempt,
                        self.max_retries,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
