//! Extraction capability trait.
//!
//! Wraps whichever LLM provider performs the schema-guided extraction. The
//! capability returns the provider's *raw response text*; tolerant parsing,
//! repair, and schema containment are pipeline responsibilities, so every
//! provider gets the same treatment of near-valid JSON.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::ExtractResult;
use crate::normalize::NormalizedDocument;
use crate::types::Schema;

/// Extraction capability consumed by the pipeline.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract schema fields from a normalized document.
    ///
    /// Returns the provider's raw response text on success. A provider that
    /// cannot serve the request (quota, auth, model error) returns
    /// `ExtractError::Provider` carrying its message verbatim.
    async fn extract(
        &self,
        document: &NormalizedDocument,
        schema: &Schema,
        timeout: Duration,
    ) -> ExtractResult<String>;

    /// Extractor name, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}
