//! Schema-Guided Batch Web Extraction
//!
//! Turn lists of URLs into structured JSON: fetch each page through an
//! injected fetch capability, reduce it to compact text, hand it to an
//! injected extraction capability with a caller-declared field schema, and
//! collect one outcome per URL (success payload or failure reason) with
//! bounded concurrency and strict per-item failure isolation.
//!
//! # Design
//!
//! - Capabilities, not clients: fetching and extraction are traits with
//!   swappable implementations, so tests run on deterministic stubs and
//!   production wires real network clients.
//! - Partial failure is normal: a batch always returns as many outcomes as
//!   it was given URLs, in input order, no matter how many items failed.
//! - The only fatal error is invalid input, rejected before any network
//!   activity starts.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pagesift::{BatchConfig, BatchPipeline, Schema};
//! use pagesift::extractors::ClaudeExtractor;
//! use pagesift::fetchers::HttpFetcher;
//!
//! let schema = Schema::from_json(r#"{"title": "string", "price": "number"}"#)?;
//! let pipeline = BatchPipeline::new(HttpFetcher::new(), ClaudeExtractor::from_env()?)
//!     .with_config(BatchConfig::new().with_concurrency(8));
//!
//! let result = pipeline.run(&urls, &schema).await?;
//! for outcome in &result {
//!     println!("{}", outcome.to_json());
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Capability abstractions (Fetcher, Extractor)
//! - [`types`] - Schema, fetched content, outcomes
//! - [`pipeline`] - The batch pipeline and its prompt
//! - [`fetchers`] - Static HTTP and rendered fetch strategies
//! - [`extractors`] - Claude-backed extraction capability
//! - [`normalize`] - Deterministic page-to-text reduction
//! - [`repair`] - Best-effort JSON repair before parsing
//! - [`sitemap`] - Sitemap URL discovery
//! - [`export`] - JSON/CSV result export
//! - [`testing`] - Mock capabilities for tests

pub mod error;
pub mod export;
pub mod extractors;
pub mod fetchers;
pub mod normalize;
pub mod pipeline;
pub mod repair;
pub mod sitemap;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    ErrorKind, ExportError, ExtractError, FetchError, ItemError, ValidationError,
};
pub use normalize::{NormalizedDocument, Normalizer};
pub use pipeline::{BatchConfig, BatchPipeline, MAX_CONCURRENCY};
pub use traits::{Extractor, Fetcher};
pub use types::{
    BatchResult, ContentKind, ExtractionOutcome, FetchedContent, FieldType, OutcomeStatus, Schema,
};

// Re-export capability implementations
pub use extractors::ClaudeExtractor;
pub use fetchers::{HttpFetcher, RenderFetcher};

// Re-export export entry points
pub use export::{export_results, ExportFormat};

// Re-export sitemap discovery
pub use sitemap::discover_urls;
