//! Fetched page content, prior to normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which fetch strategy produced a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Plain HTTP GET, no script execution
    Static,
    /// Full page load with script execution via a rendering service
    Rendered,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Static => f.write_str("static"),
            ContentKind::Rendered => f.write_str("rendered"),
        }
    }
}

/// Raw content retrieved for one URL.
///
/// Lives only for the duration of one item's processing; the pipeline
/// converts it to a normalized document and drops it. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedContent {
    /// URL the content came from
    pub url: String,

    /// Raw body (HTML for static fetches, markdown for rendered ones)
    pub body: String,

    /// Which strategy produced this content
    pub kind: ContentKind,

    /// MIME type from the response, if reported
    pub content_type: Option<String>,

    /// When the content was fetched
    pub fetched_at: DateTime<Utc>,

    /// Transport metadata (e.g. selected response headers)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl FetchedContent {
    /// Create fetched content with minimal fields.
    pub fn new(url: impl Into<String>, body: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            kind,
            content_type: None,
            fetched_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Body length in bytes.
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Whether any non-whitespace content was fetched.
    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }

    /// Whether the body should be treated as HTML markup.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(ct) => ct.contains("html"),
            // No declared type: sniff for markup
            None => self.body.trim_start().starts_with('<'),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let page = FetchedContent::new("https://example.com", "<html></html>", ContentKind::Static)
            .with_content_type("text/html; charset=utf-8")
            .with_metadata("http_status", "200");

        assert_eq!(page.url, "https://example.com");
        assert_eq!(page.kind, ContentKind::Static);
        assert!(page.is_html());
        assert_eq!(page.metadata.get("http_status"), Some(&"200".to_string()));
    }

    #[test]
    fn empty_body_detection() {
        let empty = FetchedContent::new("https://example.com", "   ", ContentKind::Static);
        assert!(!empty.has_body());

        let full = FetchedContent::new("https://example.com", "text", ContentKind::Rendered);
        assert!(full.has_body());
    }

    #[test]
    fn html_sniffing_without_content_type() {
        let html = FetchedContent::new("https://example.com", "  <!doctype html>", ContentKind::Static);
        assert!(html.is_html());

        let markdown = FetchedContent::new("https://example.com", "# Heading", ContentKind::Rendered);
        assert!(!markdown.is_html());
    }
}
