//! Extraction capability implementations.

pub mod claude;

pub use claude::ClaudeExtractor;
