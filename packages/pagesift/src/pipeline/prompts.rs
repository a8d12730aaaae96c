//! Prompt used for schema-guided extraction.

use crate::normalize::NormalizedDocument;
use crate::types::Schema;

/// Prompt template for schema-guided field extraction.
///
/// `{schema}` is replaced with the schema's example scaffold and
/// `{content}` with the normalized page text.
pub const EXTRACT_PROMPT: &str = r#"Extract structured data from this webpage content.

Return ONLY valid JSON with this exact structure (no markdown code blocks, no explanation):
{schema}

Extraction rules:
- All numbers must be actual numbers (not strings)
- Remove currency symbols ($, €, etc.) from numbers
- Remove commas from numbers (1,500 → 1500)
- Dates should be ISO format (YYYY-MM-DD) if possible
- If a field is not visible on the page, use null
- Phone numbers: keep as strings in original format
- Arrays: extract all matching items found
- Be precise - only extract what's explicitly shown

Webpage content:
{content}

Extract the data now:"#;

/// Fill the extraction prompt for one document.
pub fn format_extract_prompt(schema: &Schema, document: &NormalizedDocument) -> String {
    let scaffold = serde_json::to_string_pretty(&schema.example_json())
        .unwrap_or_else(|_| "{}".to_string());

    EXTRACT_PROMPT
        .replace("{schema}", &scaffold)
        .replace("{content}", &document.text)
}
