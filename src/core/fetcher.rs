use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::Client;

use crate::domain::ports::ZoneFetcher;
use crate::utils::error::{EtlError, Result};
use crate::utils::retry::{with_retry, RetryConfig};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (zone-etl)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    /// Per-attempt timeout.
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryConfig,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

/// HTTP GET with bounded retry; returns the whole body.
pub struct HttpFetcher {
    client: Client,
    retry: RetryConfig,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            retry: settings.retry.clone(),
        })
    }

    async fn fetch_once(&self, url: &str, attempt: u32) -> Result<Vec<u8>> {
        tracing::debug!("📡 GET {} (attempt {})", url, attempt);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            // 只支援秒數格式的 Retry-After
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());

            return Err(EtlError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                retry_after,
            });
        }

        let body = response.bytes().await?;
        tracing::debug!("📡 {} -> {} bytes", url, body.len());
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ZoneFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        with_retry(&self.retry, |attempt| self.fetch_once(url, attempt)).await
    }
}
