//! Best-effort repair of near-valid JSON from extraction providers.
//!
//! Models frequently wrap JSON in markdown fences, prepend prose, or leave
//! trailing commas. This module applies a small, bounded set of textual
//! fixups before a final parse attempt. It is not a general-purpose lenient
//! parser: anything the fixups cannot salvage stays an error, with the raw
//! text preserved by the caller.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Parse provider output, tolerating near-valid JSON.
///
/// Tries a direct parse first; on failure, applies the repair fixups and
/// parses again. The returned error is the one from the *repaired* attempt,
/// which is the closest diagnosis of what is actually wrong.
pub fn parse_lenient(raw: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(raw) {
        Ok(value) => Ok(value),
        Err(direct_err) => {
            let repaired = repair(raw);
            match repaired {
                Some(candidate) => serde_json::from_str(&candidate),
                None => Err(direct_err),
            }
        }
    }
}

/// Apply the bounded fixup set. Returns `None` when no candidate JSON
/// payload can be located at all.
fn repair(raw: &str) -> Option<String> {
    let mut text = raw.trim().to_string();

    // 1. Unwrap a markdown code fence, if present
    if let Some(caps) = CODE_FENCE.captures(&text) {
        text = caps[1].to_string();
    }

    // 2. Slice to the outermost object or array, discarding surrounding prose
    text = slice_to_payload(&text)?;

    // 3. Drop trailing commas before closing braces/brackets
    text = TRAILING_COMMA.replace_all(&text, "$1").to_string();

    Some(text)
}

/// Cut `text` down to the span between the first opening brace/bracket and
/// its matching final closer.
fn slice_to_payload(text: &str) -> Option<String> {
    let object = text.find('{').map(|start| (start, '}'));
    let array = text.find('[').map(|start| (start, ']'));

    // Prefer whichever opener appears first
    let (start, closer) = match (object, array) {
        (Some(o), Some(a)) => {
            if o.0 < a.0 {
                o
            } else {
                a
            }
        }
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return None,
    };

    let end = text.rfind(closer)?;
    if end < start {
        return None;
    }

    Some(text[start..=end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_json_passes_through() {
        let value = parse_lenient(r#"{"a": 1, "b": "two"}"#).unwrap();
        assert_eq!(value, json!({"a": 1, "b": "two"}));
    }

    #[test]
    fn repairs_trailing_comma_in_object() {
        let value = parse_lenient(r#"{"a": 1,}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn repairs_trailing_comma_in_array() {
        let value = parse_lenient(r#"{"items": [1, 2, 3,],}"#).unwrap();
        assert_eq!(value, json!({"items": [1, 2, 3]}));
    }

    #[test]
    fn unwraps_code_fence() {
        let raw = "```json\n{\"title\": \"Widget\"}\n```";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value, json!({"title": "Widget"}));
    }

    #[test]
    fn unwraps_untagged_fence() {
        let raw = "```\n{\"a\": true}\n```";
        assert_eq!(parse_lenient(raw).unwrap(), json!({"a": true}));
    }

    #[test]
    fn discards_surrounding_prose() {
        let raw = "Here is the data you asked for:\n{\"price\": 9.99}\nLet me know if you need more.";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value, json!({"price": 9.99}));
    }

    #[test]
    fn fence_and_trailing_comma_together() {
        let raw = "```json\n{\"a\": 1, \"b\": [2,],}\n```";
        assert_eq!(parse_lenient(raw).unwrap(), json!({"a": 1, "b": [2]}));
    }

    #[test]
    fn top_level_array() {
        let raw = "results: [1, 2,]";
        assert_eq!(parse_lenient(raw).unwrap(), json!([1, 2]));
    }

    #[test]
    fn unrepairable_garbage_stays_an_error() {
        assert!(parse_lenient("no json here at all").is_err());
        assert!(parse_lenient("{\"unclosed\": ").is_err());
        assert!(parse_lenient("").is_err());
    }
}
