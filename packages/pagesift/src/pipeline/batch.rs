//! Batch extraction pipeline.
//!
//! Runs schema-guided extraction over a batch of URLs with bounded
//! concurrency and independent per-item failure isolation. For each URL:
//! fetch → normalize → extract → parse/repair → contain to schema. A failure
//! in any item is captured into that item's outcome and never affects its
//! siblings; the batch only fails fast on invalid input, before any network
//! activity starts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::{ExtractError, FetchError, ItemError, ValidationError, ValidationResult};
use crate::normalize::Normalizer;
use crate::repair::parse_lenient;
use crate::traits::{Extractor, Fetcher};
use crate::types::{BatchResult, ExtractionOutcome, Schema};

/// Hard ceiling on the worker pool size.
pub const MAX_CONCURRENCY: usize = 10;

/// Default worker pool size.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default per-request deadline, applied independently to each item's fetch
/// and extraction calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum items in flight at once
    pub concurrency: usize,

    /// Deadline applied separately to each item's fetch and extract calls
    pub timeout: Duration,

    /// Ceiling on normalized document size, in characters
    pub max_document_chars: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            max_document_chars: crate::normalize::DEFAULT_MAX_CHARS,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker pool size.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the normalized-document size ceiling.
    pub fn with_max_document_chars(mut self, max_chars: usize) -> Self {
        self.max_document_chars = max_chars;
        self
    }
}

/// Schema-guided batch extraction over injected capabilities.
///
/// # Example
///
/// ```rust,ignore
/// use pagesift::{BatchConfig, BatchPipeline, Schema};
/// use pagesift::fetchers::HttpFetcher;
/// use pagesift::extractors::ClaudeExtractor;
///
/// let pipeline = BatchPipeline::new(HttpFetcher::new(), ClaudeExtractor::from_env()?)
///     .with_config(BatchConfig::new().with_concurrency(8));
/// let schema = Schema::from_json(r#"{"title": "string", "price": "number"}"#)?;
/// let result = pipeline.run(&urls, &schema).await?;
/// ```
pub struct BatchPipeline<F, E> {
    fetcher: F,
    extractor: E,
    normalizer: Normalizer,
    config: BatchConfig,
}

impl<F: Fetcher, E: Extractor> BatchPipeline<F, E> {
    /// Create a pipeline with default configuration.
    pub fn new(fetcher: F, extractor: E) -> Self {
        let config = BatchConfig::default();
        Self {
            normalizer: Normalizer::new().with_max_chars(config.max_document_chars),
            fetcher,
            extractor,
            config,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: BatchConfig) -> Self {
        self.normalizer = Normalizer::new().with_max_chars(config.max_document_chars);
        self.config = config;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run the batch.
    ///
    /// Returns one outcome per input URL, in input order, regardless of how
    /// many individual items failed. Fails fast with a [`ValidationError`]
    /// on invalid input, before any capability is invoked.
    pub async fn run(&self, urls: &[String], schema: &Schema) -> ValidationResult<BatchResult> {
        let concurrency = self.validate(urls, schema)?;

        info!(
            urls = urls.len(),
            fields = schema.len(),
            concurrency,
            fetcher = self.fetcher.name(),
            extractor = self.extractor.name(),
            "batch starting"
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let completed = Arc::new(AtomicUsize::new(0));
        let total = urls.len();

        let tasks = urls.iter().enumerate().map(|(index, url)| {
            let semaphore = Arc::clone(&semaphore);
            let completed = Arc::clone(&completed);
            async move {
                let _permit = semaphore.acquire().await.unwrap();
                let outcome = self.process_one(url, schema).await;
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(
                    url = %url,
                    index,
                    done,
                    total,
                    success = outcome.is_success(),
                    "item processed"
                );
                outcome
            }
        });

        // join_all yields results in input order, not completion order
        let outcomes = futures::future::join_all(tasks).await;
        let result = BatchResult::new(outcomes);

        info!(
            succeeded = result.success_count(),
            failed = result.failure_count(),
            "batch complete"
        );

        Ok(result)
    }

    /// Check preconditions. Returns the effective concurrency.
    fn validate(&self, urls: &[String], schema: &Schema) -> ValidationResult<usize> {
        if urls.is_empty() {
            return Err(ValidationError::EmptyUrls);
        }
        if schema.is_empty() {
            return Err(ValidationError::EmptySchema);
        }
        if self.config.concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        if self.config.timeout.is_zero() {
            return Err(ValidationError::ZeroTimeout);
        }

        for url in urls {
            let parsed = url::Url::parse(url)
                .map_err(|_| ValidationError::InvalidUrl { url: url.clone() })?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(ValidationError::InvalidUrl { url: url.clone() });
            }
        }

        let concurrency = if self.config.concurrency > MAX_CONCURRENCY {
            warn!(
                requested = self.config.concurrency,
                ceiling = MAX_CONCURRENCY,
                "concurrency clamped to ceiling"
            );
            MAX_CONCURRENCY
        } else {
            self.config.concurrency
        };

        Ok(concurrency)
    }

    /// Run the four-step algorithm for one URL, isolated from siblings.
    async fn process_one(&self, url: &str, schema: &Schema) -> ExtractionOutcome {
        // 1. Fetch, deadline-bounded from the outside as well so a stalled
        //    implementation cannot hold a worker past the timeout
        let fetched = tokio::time::timeout(
            self.config.timeout,
            self.fetcher.fetch(url, self.config.timeout),
        )
        .await;

        let page = match fetched {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                warn!(url = %url, error = %e, "fetch failed");
                return ExtractionOutcome::failure(url, ItemError::Fetch(e), false);
            }
            Err(_) => {
                warn!(url = %url, "fetch timed out");
                return ExtractionOutcome::failure(
                    url,
                    ItemError::Fetch(FetchError::Timeout {
                        url: url.to_string(),
                    }),
                    false,
                );
            }
        };

        // 2. Normalize
        let document = match self.normalizer.normalize(&page) {
            Ok(document) => document,
            Err(e) => {
                warn!(url = %url, error = %e, "normalization failed");
                return ExtractionOutcome::failure(url, e, false);
            }
        };
        let truncated = document.truncated;

        // 3. Extract
        let extracted = tokio::time::timeout(
            self.config.timeout,
            self.extractor.extract(&document, schema, self.config.timeout),
        )
        .await;

        let raw = match extracted {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(url = %url, error = %e, "extraction failed");
                return ExtractionOutcome::failure(url, ItemError::Extraction(e), truncated);
            }
            Err(_) => {
                warn!(url = %url, "extraction timed out");
                return ExtractionOutcome::failure(
                    url,
                    ItemError::Extraction(ExtractError::Timeout),
                    truncated,
                );
            }
        };

        // 4. Parse (tolerating near-valid JSON), then contain to the schema
        let value = match parse_lenient(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(url = %url, error = %e, "unparseable extraction response");
                return ExtractionOutcome::failure(
                    url,
                    ItemError::Parse {
                        reason: e.to_string(),
                        raw,
                    },
                    truncated,
                );
            }
        };

        match contain_to_schema(value, schema) {
            Ok(fields) => ExtractionOutcome::success(url, fields, truncated),
            Err(reason) => {
                warn!(url = %url, reason = %reason, "extraction response had wrong shape");
                ExtractionOutcome::failure(url, ItemError::Parse { reason, raw }, truncated)
            }
        }
    }
}

/// Restrict a parsed payload to the schema's declared fields.
///
/// Extra keys the capability invented are dropped; declared fields the
/// capability omitted stay absent. Field order follows the schema.
fn contain_to_schema(value: Value, schema: &Schema) -> Result<IndexMap<String, Value>, String> {
    let Value::Object(mut map) = value else {
        return Err(format!(
            "expected a JSON object, got {}",
            json_type_name(&value)
        ));
    };

    let mut fields = IndexMap::new();
    for (name, _) in schema.fields() {
        if let Some(v) = map.remove(name) {
            fields.insert(name.to_string(), v);
        }
    }

    Ok(fields)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn containment_drops_extra_keys() {
        let schema = Schema::from_json(r#"{"title": "string", "price": "number"}"#).unwrap();
        let value = json!({"title": "Widget", "price": 9.99, "injected": "nope"});

        let fields = contain_to_schema(value, &schema).unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields["title"], json!("Widget"));
        assert!(!fields.contains_key("injected"));
    }

    #[test]
    fn containment_allows_missing_and_null_fields() {
        let schema =
            Schema::from_json(r#"{"title": "string", "price": "number", "sku": "string"}"#)
                .unwrap();
        let value = json!({"title": "Widget", "price": null});

        let fields = contain_to_schema(value, &schema).unwrap();

        assert_eq!(fields["price"], json!(null));
        assert!(!fields.contains_key("sku"));
    }

    #[test]
    fn containment_preserves_schema_order() {
        let schema =
            Schema::from_json(r#"{"first": "string", "second": "string"}"#).unwrap();
        let value = json!({"second": "b", "first": "a"});

        let fields = contain_to_schema(value, &schema).unwrap();
        let keys: Vec<_> = fields.keys().cloned().collect();
        assert_eq!(keys, vec!["first", "second"]);
    }

    #[test]
    fn containment_rejects_non_objects() {
        let schema = Schema::from_json(r#"{"title": "string"}"#).unwrap();
        let err = contain_to_schema(json!([1, 2, 3]), &schema).unwrap_err();
        assert!(err.contains("array"));
    }

    #[test]
    fn config_builders() {
        let config = BatchConfig::new()
            .with_concurrency(8)
            .with_timeout(Duration::from_secs(5))
            .with_max_document_chars(1000);

        assert_eq!(config.concurrency, 8);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_document_chars, 1000);
    }
}
