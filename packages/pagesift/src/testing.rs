//! Testing utilities including mock capability implementations.
//!
//! These let applications (and this crate's own tests) exercise the batch
//! pipeline without real network or AI calls: canned pages and responses by
//! URL, injectable failures and delays, call tracking, and a concurrency
//! gauge for asserting the worker-pool bound.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{ExtractError, ExtractResult, FetchError, FetchResult};
use crate::normalize::NormalizedDocument;
use crate::traits::{Extractor, Fetcher};
use crate::types::{ContentKind, FetchedContent, Schema};

/// Tracks how many tasks are inside a section at once, and the peak.
///
/// Share one gauge across mock capabilities to observe the pipeline's
/// concurrency bound from the outside.
#[derive(Default)]
pub struct ConcurrencyGauge {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the gauged section; the guard exits it on drop.
    pub fn enter(&self) -> GaugeGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        GaugeGuard {
            current: Arc::clone(&self.current),
        }
    }

    /// Tasks currently inside the section.
    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Highest simultaneous occupancy observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Clone for ConcurrencyGauge {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            peak: Arc::clone(&self.peak),
        }
    }
}

/// Guard returned by [`ConcurrencyGauge::enter`].
pub struct GaugeGuard {
    current: Arc<AtomicUsize>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Mock fetch capability with canned pages by URL.
#[derive(Default)]
pub struct MockFetcher {
    pages: Arc<RwLock<HashMap<String, String>>>,
    status_failures: Arc<RwLock<HashMap<String, u16>>>,
    delay: Option<Duration>,
    kind: Option<ContentKind>,
    gauge: ConcurrencyGauge,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canned HTML page for a URL.
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), body.into());
        self
    }

    /// Make a URL fail with an HTTP status (e.g. 500).
    pub fn with_status_failure(self, url: impl Into<String>, status: u16) -> Self {
        self.status_failures
            .write()
            .unwrap()
            .insert(url.into(), status);
        self
    }

    /// Sleep this long inside every fetch (for timeout and concurrency tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report pages as this content kind instead of `Static`.
    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Share a concurrency gauge with the test.
    pub fn with_gauge(mut self, gauge: ConcurrencyGauge) -> Self {
        self.gauge = gauge;
        self
    }

    /// URLs requested so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

impl Clone for MockFetcher {
    fn clone(&self) -> Self {
        Self {
            pages: Arc::clone(&self.pages),
            status_failures: Arc::clone(&self.status_failures),
            delay: self.delay,
            kind: self.kind,
            gauge: self.gauge.clone(),
            calls: Arc::clone(&self.calls),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchResult<FetchedContent> {
        self.calls.write().unwrap().push(url.to_string());
        let _guard = self.gauge.enter();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(status) = self.status_failures.read().unwrap().get(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            });
        }

        let body = self
            .pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| {
                FetchError::Http(Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no canned page for {}", url),
                )))
            })?;

        let kind = self.kind.unwrap_or(ContentKind::Static);
        let content_type = match kind {
            ContentKind::Static => "text/html",
            ContentKind::Rendered => "text/markdown",
        };

        Ok(FetchedContent::new(url, body, kind).with_content_type(content_type))
    }

    fn kind(&self) -> ContentKind {
        self.kind.unwrap_or(ContentKind::Static)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock extraction capability with canned raw responses by URL.
pub struct MockExtractor {
    responses: Arc<RwLock<HashMap<String, String>>>,
    failures: Arc<RwLock<HashMap<String, String>>>,
    default_response: String,
    delay: Option<Duration>,
    gauge: ConcurrencyGauge,
    calls: Arc<RwLock<Vec<String>>>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self {
            responses: Arc::default(),
            failures: Arc::default(),
            default_response: "{}".to_string(),
            delay: None,
            gauge: ConcurrencyGauge::new(),
            calls: Arc::default(),
        }
    }
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canned raw response for a URL's document.
    pub fn with_response(self, url: impl Into<String>, raw: impl Into<String>) -> Self {
        self.responses.write().unwrap().insert(url.into(), raw.into());
        self
    }

    /// Make a URL's extraction fail with a provider message.
    pub fn with_failure(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .write()
            .unwrap()
            .insert(url.into(), message.into());
        self
    }

    /// Raw response returned for URLs with no canned entry (default `{}`).
    pub fn with_default_response(mut self, raw: impl Into<String>) -> Self {
        self.default_response = raw.into();
        self
    }

    /// Sleep this long inside every extraction.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Share a concurrency gauge with the test.
    pub fn with_gauge(mut self, gauge: ConcurrencyGauge) -> Self {
        self.gauge = gauge;
        self
    }

    /// URLs extracted so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

impl Clone for MockExtractor {
    fn clone(&self) -> Self {
        Self {
            responses: Arc::clone(&self.responses),
            failures: Arc::clone(&self.failures),
            default_response: self.default_response.clone(),
            delay: self.delay,
            gauge: self.gauge.clone(),
            calls: Arc::clone(&self.calls),
        }
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract(
        &self,
        document: &NormalizedDocument,
        _schema: &Schema,
        _timeout: Duration,
    ) -> ExtractResult<String> {
        self.calls.write().unwrap().push(document.url.clone());
        let _guard = self.gauge.enter();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.failures.read().unwrap().get(&document.url) {
            return Err(ExtractError::Provider(message.clone()));
        }

        Ok(self
            .responses
            .read()
            .unwrap()
            .get(&document.url)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
