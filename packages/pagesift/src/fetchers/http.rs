//! Static HTTP fetch strategy.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::traits::Fetcher;
use crate::types::{ContentKind, FetchedContent};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Fetcher for static pages: a plain HTTP GET, no script execution.
///
/// Fast and sufficient for server-rendered sites. For pages that require
/// JavaScript, configure the pipeline with
/// [`RenderFetcher`](crate::fetchers::RenderFetcher) instead.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a fetcher with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .build()
                .expect("Failed to create HTTP client"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<FetchedContent> {
        debug!(url = %url, "static fetch starting");

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Http(Box::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let final_url = response.url().to_string();

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Http(Box::new(e))
            }
        })?;

        debug!(url = %url, bytes = body.len(), "static fetch complete");

        let mut page = FetchedContent::new(url, body, ContentKind::Static)
            .with_metadata("http_status", status.as_u16().to_string())
            .with_metadata("final_url", final_url);

        if let Some(ct) = content_type {
            page = page.with_content_type(ct);
        }

        Ok(page)
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Static
    }

    fn name(&self) -> &str {
        "http"
    }
}
