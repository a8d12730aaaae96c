//! Rendered fetch strategy, backed by a hosted rendering API.
//!
//! Pages that only materialize their content after script execution are
//! fetched through a rendering service speaking plain HTTP; the service
//! loads the page in a real browser and returns markdown. The pipeline
//! never embeds a browser itself.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::traits::Fetcher;
use crate::types::{ContentKind, FetchedContent};

const RENDER_API_URL: &str = "https://api.firecrawl.dev/v1";

#[derive(Serialize)]
struct ScrapeRequest {
    url: String,
    formats: Vec<String>,
}

#[derive(Deserialize)]
struct ScrapeResponse {
    success: bool,
    data: Option<ScrapeData>,
}

#[derive(Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
    metadata: Option<PageMetadata>,
}

#[derive(Deserialize)]
struct PageMetadata {
    title: Option<String>,
}

/// Fetcher for JavaScript-heavy pages via a rendering API.
///
/// # Example
///
/// ```rust,ignore
/// use pagesift::fetchers::RenderFetcher;
///
/// let fetcher = RenderFetcher::from_env()?;
/// let page = fetcher.fetch("https://spa.example", timeout).await?;
/// ```
pub struct RenderFetcher {
    client: reqwest::Client,
    api_key: SecretBox<str>,
    base_url: String,
}

impl RenderFetcher {
    /// Create a rendered fetcher with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .build()
                .expect("Failed to create HTTP client"),
            api_key: SecretBox::new(api_key.into().into_boxed_str()),
            base_url: RENDER_API_URL.to_string(),
        }
    }

    /// Create from environment variable `RENDER_API_KEY`.
    pub fn from_env() -> FetchResult<Self> {
        let api_key = std::env::var("RENDER_API_KEY")
            .map_err(|_| FetchError::Render("RENDER_API_KEY environment variable not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl Fetcher for RenderFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<FetchedContent> {
        debug!(url = %url, "rendered fetch starting");

        let request = ScrapeRequest {
            url: url.to_string(),
            formats: vec!["markdown".to_string()],
        };

        let response = self
            .client
            .post(format!("{}/scrape", self.base_url))
            .timeout(timeout)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "render API request failed");
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
            let text = response.text().await.unwrap_or_default();
            return Err(FetchError::Render(format!(
                "render API returned {}: {}",
                status, text
            )));
        }

        let scrape: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        if !scrape.success {
            return Err(FetchError::Render(format!("render failed for {}", url)));
        }

        let data = scrape
            .data
            .ok_or_else(|| FetchError::Render(format!("no data returned for {}", url)))?;

        let markdown = data
            .markdown
            .ok_or_else(|| FetchError::Render(format!("no markdown returned for {}", url)))?;

        debug!(url = %url, bytes = markdown.len(), "rendered fetch complete");

        let mut page = FetchedContent::new(url, markdown, ContentKind::Rendered)
            .with_content_type("text/markdown");

        if let Some(title) = data.metadata.and_then(|m| m.title) {
            page = page.with_metadata("title", title);
        }

        Ok(page)
    }

    fn kind(&self) -> ContentKind {
        ContentKind::Rendered
    }

    fn name(&self) -> &str {
        "rendered"
    }
}
