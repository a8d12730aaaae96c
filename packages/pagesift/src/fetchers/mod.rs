//! Fetch capability implementations.
//!
//! - [`HttpFetcher`] - static pages, plain HTTP GET
//! - [`RenderFetcher`] - JavaScript-heavy pages via a hosted rendering API

pub mod http;
pub mod rendered;

pub use http::HttpFetcher;
pub use rendered::RenderFetcher;
