//! Deterministic reduction of fetched pages to extraction-ready text.
//!
//! The goal is byte economy for the downstream extraction call: strip
//! scripts, styles, and navigation boilerplate while keeping the semantic
//! structure (headings, lists, tables, links) a model needs to locate
//! fields. Output above the size ceiling is cut at the head and the cut is
//! recorded, never silently dropped.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ItemError;
use crate::types::FetchedContent;

/// Marker appended when content is cut at the size ceiling.
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// Default ceiling on normalized text, in characters.
pub const DEFAULT_MAX_CHARS: usize = 50_000;

static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?si)<script[^>]*>.*?</script>").unwrap());
static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?si)<style[^>]*>.*?</style>").unwrap());
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)<(nav|header|footer|aside)[^>]*>.*?</(nav|header|footer|aside)>").unwrap()
});
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?si)<h([1-6])[^>]*>(.*?)</h[1-6]>").unwrap());
static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?si)<p[^>]*>(.*?)</p>").unwrap());
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?si)<a[^>]*href=["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap());
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?si)<li[^>]*>(.*?)</li>").unwrap());
static TABLE_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</t[dh]>").unwrap());
static TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</tr>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static MULTI_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Compact textual representation of one fetched page.
///
/// Owned by the pipeline during a single item's processing; not shared
/// across items.
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    /// URL the document was derived from
    pub url: String,

    /// Extraction-ready text
    pub text: String,

    /// Whether the text was cut at the size ceiling
    pub truncated: bool,
}

impl NormalizedDocument {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Deterministic HTML-to-text normalizer with a size ceiling.
#[derive(Debug, Clone)]
pub struct Normalizer {
    max_chars: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Set the ceiling on normalized text length, in characters.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Normalize fetched content into extraction-ready text.
    ///
    /// HTML bodies are reduced to markdown-like text; already-textual
    /// bodies (rendered markdown, plain text) pass through. Either way the
    /// ceiling applies. A body that reduces to nothing is a normalization
    /// failure.
    pub fn normalize(&self, page: &FetchedContent) -> Result<NormalizedDocument, ItemError> {
        if !page.has_body() {
            return Err(ItemError::Normalize(format!(
                "no content fetched for {}",
                page.url
            )));
        }

        let text = if page.is_html() {
            html_to_text(&page.body)
        } else {
            page.body.trim().to_string()
        };

        if text.is_empty() {
            return Err(ItemError::Normalize(format!(
                "no extractable text after markup removal for {}",
                page.url
            )));
        }

        let (text, truncated) = truncate_head(text, self.max_chars);

        tracing::debug!(
            url = %page.url,
            chars = text.chars().count(),
            truncated,
            "normalized page"
        );

        Ok(NormalizedDocument {
            url: page.url.clone(),
            text,
            truncated,
        })
    }
}

/// Reduce HTML markup to markdown-like text.
fn html_to_text(html: &str) -> String {
    let mut text = html.to_string();

    // Drop non-content blocks first
    text = SCRIPT.replace_all(&text, "").to_string();
    text = STYLE.replace_all(&text, "").to_string();
    text = BOILERPLATE.replace_all(&text, "").to_string();
    text = COMMENT.replace_all(&text, "").to_string();

    // Structure markers the extraction call relies on
    text = HEADING
        .replace_all(&text, |caps: &regex::Captures| {
            let level: usize = caps[1].parse().unwrap_or(1);
            format!("\n{} {}\n", "#".repeat(level), caps[2].trim())
        })
        .to_string();
    text = PARAGRAPH.replace_all(&text, "$1\n\n").to_string();
    text = LINE_BREAK.replace_all(&text, "\n").to_string();
    text = LINK.replace_all(&text, "[$2]($1)").to_string();
    text = LIST_ITEM.replace_all(&text, "- $1\n").to_string();
    text = TABLE_CELL.replace_all(&text, " | ").to_string();
    text = TABLE_ROW.replace_all(&text, "\n").to_string();

    // Remove remaining tags
    text = TAG.replace_all(&text, "").to_string();

    // Decode common entities
    text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    // Collapse whitespace left behind by removed blocks
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    text = lines.join("\n");
    text = MULTI_NEWLINE.replace_all(&text, "\n\n").to_string();

    text.trim().to_string()
}

/// Cut `text` to at most `max_chars` characters, keeping the head.
///
/// The marker is appended on top of the ceiling so the cut itself stays
/// visible in the output.
fn truncate_head(text: String, max_chars: usize) -> (String, bool) {
    if text.chars().count() <= max_chars {
        return (text, false);
    }

    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str(TRUNCATION_MARKER);
    (cut, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentKind;

    fn html_page(body: &str) -> FetchedContent {
        FetchedContent::new("https://example.com/item", body, ContentKind::Static)
            .with_content_type("text/html")
    }

    #[test]
    fn strips_scripts_styles_and_nav() {
        let page = html_page(
            r#"<html><head><style>body { color: red; }</style>
            <script>alert("hi")</script></head>
            <body><nav><a href="/">Home</a></nav>
            <h1>Widget</h1><p>A fine widget.</p>
            <footer>© 2024</footer></body></html>"#,
        );

        let doc = Normalizer::new().normalize(&page).unwrap();

        assert!(doc.text.contains("# Widget"));
        assert!(doc.text.contains("A fine widget."));
        assert!(!doc.text.contains("alert"));
        assert!(!doc.text.contains("color: red"));
        assert!(!doc.text.contains("Home"));
        assert!(!doc.text.contains("©"));
    }

    #[test]
    fn preserves_lists_and_tables() {
        let page = html_page(
            "<ul><li>First</li><li>Second</li></ul>\
             <table><tr><th>Name</th><th>Price</th></tr>\
             <tr><td>Widget</td><td>9.99</td></tr></table>",
        );

        let doc = Normalizer::new().normalize(&page).unwrap();

        assert!(doc.text.contains("- First"));
        assert!(doc.text.contains("- Second"));
        assert!(doc.text.contains("Widget | 9.99"));
    }

    #[test]
    fn preserves_links() {
        let page = html_page(r#"<p>See <a href="https://example.com/docs">the docs</a>.</p>"#);
        let doc = Normalizer::new().normalize(&page).unwrap();
        assert!(doc.text.contains("[the docs](https://example.com/docs)"));
    }

    #[test]
    fn rendered_markdown_passes_through() {
        let page = FetchedContent::new(
            "https://example.com",
            "# Already markdown\n\nNo tags here.",
            ContentKind::Rendered,
        )
        .with_content_type("text/markdown");

        let doc = Normalizer::new().normalize(&page).unwrap();
        assert_eq!(doc.text, "# Already markdown\n\nNo tags here.");
        assert!(!doc.truncated);
    }

    #[test]
    fn truncates_at_ceiling_with_marker() {
        let body = "word ".repeat(100);
        let page = FetchedContent::new("https://example.com", body, ContentKind::Rendered);

        let doc = Normalizer::new().with_max_chars(50).normalize(&page).unwrap();

        assert!(doc.truncated);
        assert!(doc.text.ends_with(TRUNCATION_MARKER));
        assert_eq!(doc.char_count(), 50 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn truncation_is_char_safe() {
        let body = "é".repeat(100);
        let page = FetchedContent::new("https://example.com", body, ContentKind::Rendered);

        let doc = Normalizer::new().with_max_chars(10).normalize(&page).unwrap();
        assert!(doc.truncated);
        assert!(doc.text.starts_with(&"é".repeat(10)));
    }

    #[test]
    fn empty_body_is_a_normalization_failure() {
        let page = FetchedContent::new("https://example.com", "  \n ", ContentKind::Static);
        let err = Normalizer::new().normalize(&page).unwrap_err();
        assert!(matches!(err, ItemError::Normalize(_)));
    }

    #[test]
    fn markup_only_body_is_a_normalization_failure() {
        let page = html_page("<script>only()</script>");
        assert!(Normalizer::new().normalize(&page).is_err());
    }

    #[test]
    fn under_ceiling_is_not_marked_truncated() {
        let page = html_page("<p>short</p>");
        let doc = Normalizer::new().normalize(&page).unwrap();
        assert!(!doc.truncated);
        assert!(!doc.text.contains("truncated"));
    }
}
