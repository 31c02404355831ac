//! Anchor harvesting.

use super::strip_tags;
use crate::normalize::{absolutize, decode_entities};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s+(?:[^>]*?\s+)?href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a\s*>"#).unwrap()
});
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s+(?:[^>]*?\s+)?href\s*=\s*["']([^"']+)["'][^>]*>"#).unwrap()
});

/// An `<a href>` element: the raw href and its visible text with tags stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

/// All closed anchors in document order.
pub fn extract_anchors(html: &str) -> Vec<Anchor> {
    ANCHOR_RE
        .captures_iter(html)
        .map(|caps| Anchor {
            href: decode_entities(caps[1].trim()),
            text: strip_tags(&caps[2]),
        })
        .collect()
}

/// Every href on an anchor start tag, including unclosed anchors.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    HREF_RE
        .captures_iter(html)
        .map(|caps| decode_entities(caps[1].trim()))
        .collect()
}

/// Absolute, fragment-free http(s) URLs linked from a page, first occurrence
/// order, without duplicates.
pub fn discover_links(html: &str, page_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for href in extract_hrefs(html) {
        if let Some(absolute) = absolutize(page_url, &href) {
            let absolute = absolute.to_string();
            if seen.insert(absolute.clone()) {
                links.push(absolute);
            }
        }
    }

    links
}
