//! Typed errors for the extraction pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. `ValidationError` is the only
//! kind that aborts a batch; everything else is captured per-URL into an
//! [`ItemError`] inside that URL's outcome.

use thiserror::Error;

/// Invalid input to `run`; the batch never starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The URL list was empty
    #[error("url list is empty")]
    EmptyUrls,

    /// The schema declared no fields
    #[error("schema declares no fields")]
    EmptySchema,

    /// A URL was not a well-formed absolute http(s) URL
    #[error("invalid url: {url}")]
    InvalidUrl { url: String },

    /// Concurrency must be at least 1
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    /// Per-request timeout must be positive
    #[error("per-request timeout must be greater than zero")]
    ZeroTimeout,

    /// A schema field used a type tag outside the supported set
    #[error("unknown type `{type_tag}` for field `{field}` (expected string, number, boolean, array, or object)")]
    UnknownFieldType { field: String, type_tag: String },

    /// Schema text was not a JSON object of field → type tag
    #[error("schema must be a JSON object mapping field names to type tags: {0}")]
    MalformedSchema(#[source] serde_json::Error),
}

/// Errors from the fetch capability (one URL's transport).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connection refused, TLS)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-2xx response status
    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    /// The fetch exceeded its deadline
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// The URL could not be parsed by the client
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Rendering service reported failure or returned no content
    #[error("render service error: {0}")]
    Render(String),
}

/// Errors from the extraction capability (provider-side).
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The provider reported failure (quota, auth, model error).
    /// Carries the provider's message verbatim.
    #[error("provider error: {0}")]
    Provider(String),

    /// Transport-level failure talking to the provider
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The extraction call exceeded its deadline
    #[error("timeout waiting for extraction")]
    Timeout,
}

/// A single URL's failure, recorded in its outcome.
///
/// These never propagate out of the batch; the pipeline converts each into
/// an `ExtractionOutcome::Failure` and moves on.
#[derive(Debug, Error)]
pub enum ItemError {
    /// Fetch step failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Normalization produced nothing usable
    #[error("normalization failed: {0}")]
    Normalize(String),

    /// The capability's response was unparseable even after repair.
    /// The raw response text is kept for diagnosis.
    #[error("unparseable extraction response: {reason}")]
    Parse { reason: String, raw: String },

    /// The extraction capability reported failure
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),
}

impl ItemError {
    /// The error kind, for reporting and export.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ItemError::Fetch(_) => ErrorKind::Fetch,
            ItemError::Normalize(_) => ErrorKind::Normalize,
            ItemError::Parse { .. } => ErrorKind::Parse,
            ItemError::Extraction(_) => ErrorKind::Extraction,
        }
    }

    /// Raw diagnostic payload, where one exists (the unparseable response).
    pub fn detail(&self) -> Option<&str> {
        match self {
            ItemError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Which step of the per-item algorithm failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Normalize,
    Parse,
    Extraction,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Fetch => "fetch_error",
            ErrorKind::Normalize => "normalization_error",
            ErrorKind::Parse => "parse_error",
            ErrorKind::Extraction => "extraction_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors writing a batch result to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Output extension is neither .json nor .csv
    #[error("unsupported output format: {extension} (use .json or .csv)")]
    UnsupportedFormat { extension: String },

    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for batch validation.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for extraction capability calls.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_error_kinds() {
        let fetch = ItemError::Fetch(FetchError::Timeout {
            url: "https://a.example".into(),
        });
        assert_eq!(fetch.kind(), ErrorKind::Fetch);
        assert!(fetch.detail().is_none());

        let parse = ItemError::Parse {
            reason: "expected value".into(),
            raw: "not json".into(),
        };
        assert_eq!(parse.kind(), ErrorKind::Parse);
        assert_eq!(parse.detail(), Some("not json"));
    }

    #[test]
    fn extraction_error_preserves_provider_message() {
        let err = ItemError::Extraction(ExtractError::Provider("rate_limit_error: slow down".into()));
        assert!(err.to_string().contains("rate_limit_error: slow down"));
        assert_eq!(err.kind(), ErrorKind::Extraction);
    }

    #[test]
    fn error_kind_labels() {
        assert_eq!(ErrorKind::Fetch.as_str(), "fetch_error");
        assert_eq!(ErrorKind::Parse.to_string(), "parse_error");
    }
}
