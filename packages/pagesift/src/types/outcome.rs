//! Per-URL outcomes and the assembled batch result.

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::error::ItemError;

/// Success-or-failure result for one URL.
#[derive(Debug)]
pub enum OutcomeStatus {
    /// Extraction succeeded; payload keys are a subset of the schema's fields
    Success(IndexMap<String, Value>),
    /// One of the per-item steps failed
    Failure(ItemError),
}

/// The recorded result of processing one URL.
#[derive(Debug)]
pub struct ExtractionOutcome {
    /// The input URL this outcome corresponds to
    pub url: String,

    /// Whether normalized content was cut at the size ceiling
    pub truncated: bool,

    /// Success payload or failure reason
    pub status: OutcomeStatus,
}

impl ExtractionOutcome {
    /// Record a successful extraction.
    pub fn success(url: impl Into<String>, fields: IndexMap<String, Value>, truncated: bool) -> Self {
        Self {
            url: url.into(),
            truncated,
            status: OutcomeStatus::Success(fields),
        }
    }

    /// Record a failed extraction.
    pub fn failure(url: impl Into<String>, error: ItemError, truncated: bool) -> Self {
        Self {
            url: url.into(),
            truncated,
            status: OutcomeStatus::Failure(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success(_))
    }

    /// The extracted payload, when this outcome succeeded.
    pub fn fields(&self) -> Option<&IndexMap<String, Value>> {
        match &self.status {
            OutcomeStatus::Success(fields) => Some(fields),
            OutcomeStatus::Failure(_) => None,
        }
    }

    /// The failure reason, when this outcome failed.
    pub fn error(&self) -> Option<&ItemError> {
        match &self.status {
            OutcomeStatus::Success(_) => None,
            OutcomeStatus::Failure(error) => Some(error),
        }
    }

    /// Flattened JSON row for export and display.
    ///
    /// Successes carry their payload fields plus `url`; failures carry
    /// `url`, `error`, `error_kind`, and the raw diagnostic under `detail`
    /// where one exists. Truncation is always surfaced when it occurred.
    pub fn to_json(&self) -> Value {
        let mut row = serde_json::Map::new();
        match &self.status {
            OutcomeStatus::Success(fields) => {
                for (key, value) in fields {
                    row.insert(key.clone(), value.clone());
                }
            }
            OutcomeStatus::Failure(error) => {
                row.insert("error".into(), json!(error.to_string()));
                row.insert("error_kind".into(), json!(error.kind().as_str()));
                if let Some(detail) = error.detail() {
                    row.insert("detail".into(), json!(detail));
                }
            }
        }
        row.insert("url".into(), json!(self.url));
        if self.truncated {
            row.insert("truncated".into(), json!(true));
        }
        Value::Object(row)
    }
}

/// Ordered batch result, index-aligned with the input URL list.
///
/// `len()` always equals the number of input URLs; partial failure never
/// shrinks or reorders the batch.
#[derive(Debug, Default)]
pub struct BatchResult {
    outcomes: Vec<ExtractionOutcome>,
}

impl BatchResult {
    pub fn new(outcomes: Vec<ExtractionOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ExtractionOutcome> {
        self.outcomes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractionOutcome> {
        self.outcomes.iter()
    }

    pub fn into_vec(self) -> Vec<ExtractionOutcome> {
        self.outcomes
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// Outcomes that failed, with their reasons.
    pub fn failures(&self) -> impl Iterator<Item = &ExtractionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

impl std::ops::Index<usize> for BatchResult {
    type Output = ExtractionOutcome;

    fn index(&self, index: usize) -> &Self::Output {
        &self.outcomes[index]
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a ExtractionOutcome;
    type IntoIter = std::slice::Iter<'a, ExtractionOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, FetchError};

    fn sample_fields() -> IndexMap<String, Value> {
        let mut fields = IndexMap::new();
        fields.insert("title".to_string(), json!("Widget"));
        fields.insert("price".to_string(), json!(9.99));
        fields
    }

    #[test]
    fn success_outcome() {
        let outcome = ExtractionOutcome::success("https://a.example", sample_fields(), false);
        assert!(outcome.is_success());
        assert_eq!(outcome.fields().unwrap()["price"], json!(9.99));
        assert!(outcome.error().is_none());
    }

    #[test]
    fn failure_outcome() {
        let outcome = ExtractionOutcome::failure(
            "https://b.example",
            ItemError::Fetch(FetchError::Status {
                url: "https://b.example".into(),
                status: 500,
            }),
            false,
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.error().unwrap().kind(), ErrorKind::Fetch);
    }

    #[test]
    fn json_row_shapes() {
        let ok = ExtractionOutcome::success("https://a.example", sample_fields(), true);
        let row = ok.to_json();
        assert_eq!(row["title"], json!("Widget"));
        assert_eq!(row["url"], json!("https://a.example"));
        assert_eq!(row["truncated"], json!(true));

        let failed = ExtractionOutcome::failure(
            "https://b.example",
            ItemError::Parse {
                reason: "expected value".into(),
                raw: "oops".into(),
            },
            false,
        );
        let row = failed.to_json();
        assert_eq!(row["error_kind"], json!("parse_error"));
        assert_eq!(row["detail"], json!("oops"));
        assert!(row.get("truncated").is_none());
    }

    #[test]
    fn batch_counters() {
        let result = BatchResult::new(vec![
            ExtractionOutcome::success("https://a.example", sample_fields(), false),
            ExtractionOutcome::failure(
                "https://b.example",
                ItemError::Normalize("no extractable text".into()),
                false,
            ),
        ]);

        assert_eq!(result.len(), 2);
        assert_eq!(result.success_count(), 1);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.failures().count(), 1);
        assert_eq!(result[0].url, "https://a.example");
    }
}
