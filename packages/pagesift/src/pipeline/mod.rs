//! Batch extraction pipeline - the core of the library.
//!
//! The pipeline orchestrates, per URL:
//! - Fetch (via an injected [`crate::traits::Fetcher`])
//! - Normalize (deterministic markup reduction with a size ceiling)
//! - Extract (via an injected [`crate::traits::Extractor`])
//! - Parse with best-effort JSON repair, then contain to the schema
//!
//! with bounded concurrency and per-item failure isolation.

pub mod batch;
pub mod prompts;

pub use batch::{
    BatchConfig, BatchPipeline, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT, MAX_CONCURRENCY,
};
pub use prompts::{format_extract_prompt, EXTRACT_PROMPT};
