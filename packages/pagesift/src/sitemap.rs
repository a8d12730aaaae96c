//! Sitemap URL discovery.
//!
//! One-shot helper for building a URL list from a site's sitemap. Probes
//! the conventional locations and parses `<urlset>` entries. This is not a
//! crawler: no link following, and sitemap-index documents yield nothing.

use quick_xml::events::Event;
use tracing::{debug, info, warn};

use crate::error::{FetchError, FetchResult};

/// Conventional sitemap paths, tried in order.
const SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemap-index.xml"];

/// Fetch URLs from a site's sitemap.
///
/// Tries each conventional location until one yields URLs; a candidate that
/// fails to fetch or parse falls through to the next. Returns an empty list
/// when no sitemap is found.
pub async fn discover_urls(base_url: &str, limit: Option<usize>) -> FetchResult<Vec<String>> {
    let base = url::Url::parse(base_url).map_err(|_| FetchError::InvalidUrl {
        url: base_url.to_string(),
    })?;

    let client = reqwest::Client::new();

    for path in SITEMAP_PATHS {
        let candidate = match base.join(path) {
            Ok(url) => url,
            Err(_) => continue,
        };

        debug!(url = %candidate, "trying sitemap location");

        let response = match client.get(candidate.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %candidate, error = %e, "sitemap fetch failed");
                continue;
            }
        };

        if !response.status().is_success() {
            continue;
        }

        let xml = match response.text().await {
            Ok(xml) => xml,
            Err(e) => {
                debug!(url = %candidate, error = %e, "sitemap body unreadable");
                continue;
            }
        };

        match parse_urlset(&xml, limit) {
            Ok(urls) if !urls.is_empty() => {
                info!(url = %candidate, count = urls.len(), "sitemap URLs discovered");
                return Ok(urls);
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(url = %candidate, error = %e, "sitemap parse failed");
                continue;
            }
        }
    }

    Ok(Vec::new())
}

/// Parse all `<url><loc>` entries from a urlset document.
///
/// Sitemap-index documents (which point at other sitemaps rather than
/// pages) return an empty list.
pub fn parse_urlset(xml: &str, limit: Option<usize>) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut in_url = false;
    let mut in_loc = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sitemapindex" => return Ok(Vec::new()),
                b"url" => in_url = true,
                b"loc" if in_url => in_loc = true,
                _ => {}
            },
            Ok(Event::Text(e)) if in_loc => {
                urls.push(e.unescape()?.trim().to_string());
                if let Some(limit) = limit {
                    if urls.len() >= limit {
                        return Ok(urls);
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"loc" => in_loc = false,
                b"url" => in_url = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e),
            _ => {}
        }
        buf.clear();
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/a</loc><lastmod>2024-01-01</lastmod></url>
  <url><loc>https://example.com/b</loc></url>
  <url><loc> https://example.com/c </loc></url>
</urlset>"#;

    #[test]
    fn parses_namespaced_urlset() {
        let urls = parse_urlset(URLSET, None).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/c",
            ]
        );
    }

    #[test]
    fn respects_limit() {
        let urls = parse_urlset(URLSET, Some(2)).unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn parses_plain_urlset() {
        let xml = "<urlset><url><loc>https://example.com/x</loc></url></urlset>";
        assert_eq!(
            parse_urlset(xml, None).unwrap(),
            vec!["https://example.com/x"]
        );
    }

    #[test]
    fn sitemap_index_yields_nothing() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/sitemap-1.xml</loc></sitemap>
</sitemapindex>"#;
        assert!(parse_urlset(xml, None).unwrap().is_empty());
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_urlset("<urlset><url></loc>", None).is_err());
    }

    #[test]
    fn ignores_loc_outside_url() {
        let xml = "<urlset><loc>https://stray.example</loc></urlset>";
        assert!(parse_urlset(xml, None).unwrap().is_empty());
    }
}
