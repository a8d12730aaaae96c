//! Fetch capability trait.
//!
//! The pipeline does not own any transport; it consumes a [`Fetcher`]
//! supplied by the surrounding application. Two production strategies ship
//! with this crate: [`crate::fetchers::HttpFetcher`] for static pages and
//! [`crate::fetchers::RenderFetcher`] for pages that need script execution.
//! Strategy choice is pipeline-level configuration, never per-URL detection.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::FetchResult;
use crate::types::{ContentKind, FetchedContent};

/// Fetch capability consumed by the pipeline.
///
/// Implementations must honor `timeout` as the deadline for the whole
/// request; the pipeline additionally enforces it from the outside, so a
/// stalled implementation cannot hold a worker past the deadline.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch raw content for one URL.
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<FetchedContent>;

    /// Which content kind this strategy produces.
    fn kind(&self) -> ContentKind;

    /// Fetcher name, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}
