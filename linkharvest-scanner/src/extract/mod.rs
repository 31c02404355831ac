//! Pattern-based extraction of page facts from raw HTML.
//!
//! No DOM is built. Every pattern lives in this module tree so the rest of the
//! crate only sees plain strings and [`Anchor`] values.
//!
//! Accepted approximations:
//! - anchor text keeps only the characters outside nested tags
//! - self-closing or unterminated tags are matched up to the next closing tag
//! - comments and CDATA are not skipped

pub mod links;
pub mod text;

pub use links::{Anchor, discover_links, extract_anchors, extract_hrefs};
pub use text::{StructuredText, extract_structured_text};

use crate::normalize::decode_entities;
use crate::result::PageMetadata;
use regex::Regex;
use std::sync::LazyLock;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>([^<]+)</title\s*>").unwrap());
static META_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").unwrap());
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z][a-zA-Z0-9:_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>.*?</h1\s*>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Text of the first `<title>`, trimmed and entity-decoded. Empty when absent.
pub fn extract_title(html: &str) -> String {
    TITLE_RE
        .captures(html)
        .map(|caps| decode_entities(caps[1].trim()))
        .unwrap_or_default()
}

/// Content of the first `<meta>` whose `name` (or `property`, for `og:` keys)
/// equals `name`, case-insensitively. Empty when absent.
pub fn extract_meta_content(html: &str, name: &str) -> String {
    let wants_property = name.starts_with("og:");

    for tag in META_RE.find_iter(html) {
        let attrs = tag_attributes(tag.as_str());
        let key_matches = attrs.iter().any(|(attr, value)| {
            (attr == "name" || (wants_property && attr == "property"))
                && value.eq_ignore_ascii_case(name)
        });
        if !key_matches {
            continue;
        }
        if let Some((_, content)) = attrs.iter().find(|(attr, _)| attr == "content") {
            return decode_entities(content.trim());
        }
    }

    String::new()
}

pub fn extract_metadata(html: &str) -> PageMetadata {
    PageMetadata {
        description: extract_meta_content(html, "description"),
        keywords: extract_meta_content(html, "keywords"),
        og_title: extract_meta_content(html, "og:title"),
        og_description: extract_meta_content(html, "og:description"),
        og_image: extract_meta_content(html, "og:image"),
    }
}

pub fn count_h1(html: &str) -> usize {
    H1_RE.find_iter(html).count()
}

/// Remove markup from a fragment and collapse runs of whitespace.
pub fn strip_tags(fragment: &str) -> String {
    let without_tags = TAG_RE.replace_all(fragment, "");
    WS_RE.replace_all(&without_tags, " ").trim().to_string()
}

/// Attribute name/value pairs of a single start tag, names lower-cased.
fn tag_attributes(tag: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(tag)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (caps[1].to_ascii_lowercase(), value)
        })
        .collect()
}
