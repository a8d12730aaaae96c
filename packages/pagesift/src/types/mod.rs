//! Core data types for the batch extraction pipeline.

pub mod outcome;
pub mod page;
pub mod schema;

pub use outcome::{BatchResult, ExtractionOutcome, OutcomeStatus};
pub use page::{ContentKind, FetchedContent};
pub use schema::{FieldType, Schema};
