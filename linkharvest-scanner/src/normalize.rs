//! URL and text normalisation shared by the extractor, the crawler and the
//! search-result resolver.
//!
//! Scope is defined by [`depth_from_base`]: a target is in scope for a base URL
//! when it has the same origin and its path sits at or below the base path.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use url::Url;

/// Hosts never treated as search results (the engine itself and its CDNs).
pub const EXCLUDED_DOMAINS: &[&str] = &[
    "google.com",
    "google.ca",
    "google.co.uk",
    "google.de",
    "google.fr",
    "google.es",
    "google.it",
    "google.nl",
    "google.se",
    "google.no",
    "google.dk",
    "google.fi",
    "google.co.jp",
    "google.com.au",
    "google.co.nz",
    "google.co.in",
    "google.com.br",
    "google.com.mx",
    "google.com.ar",
    "google.co.za",
    "googleapis.com",
    "googleusercontent.com",
    "googlevideo.com",
    "gstatic.com",
    "youtube.com",
    "youtu.be",
];

const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", " "),
    ("ndash", "–"),
    ("mdash", "—"),
    ("hellip", "..."),
    ("copy", "©"),
    ("reg", "®"),
    ("trade", "™"),
    ("euro", "€"),
    ("pound", "£"),
    ("yen", "¥"),
    ("cent", "¢"),
    ("raquo", "»"),
    ("laquo", "«"),
    ("deg", "°"),
    ("plusmn", "±"),
    ("frac12", "½"),
    ("frac14", "¼"),
    ("frac34", "¾"),
    ("times", "×"),
    ("divide", "÷"),
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("omega", "ω"),
    ("pi", "π"),
    ("sigma", "σ"),
    ("mu", "μ"),
    ("lambda", "λ"),
    ("theta", "θ"),
];

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)&(#x[0-9a-f]+|#[0-9]+|[a-z][a-z0-9]*);").unwrap()
});

/// Decode HTML character references in a single pass.
///
/// Named references come from a fixed table; decimal and hex references are
/// decoded when they name a valid scalar value. Anything else is left as is.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<String> {
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    if let Some(dec) = body.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32).map(String::from);
    }

    let name = body.to_ascii_lowercase();
    NAMED_ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|(_, value)| value.to_string())
}

/// Resolve an href the way a browser would for link statistics.
///
/// Only pure fragments and `javascript:` pseudo-links are discarded, so
/// `mailto:` and similar links survive and classify as external.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    base.join(href).ok()
}

/// Resolve an href into a crawlable absolute http(s) URL without fragment.
pub fn absolutize(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved)
}

/// Canonical string form of an absolute URL with the fragment removed.
pub fn normalize_url(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url.trim()).ok()?;
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

pub fn strip_query_and_fragment(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Path-segment distance of `target` below `base`.
///
/// Returns `None` when the origins differ or when the target path is not the
/// base path or one of its descendants. Trailing slashes are ignored, so
/// `/blog` and `/blog/` are the same scope root.
pub fn depth_from_base(base: &str, target: &str) -> Option<usize> {
    let base = Url::parse(base).ok()?;
    let target = Url::parse(target).ok()?;

    if !is_same_origin(&base, &target) {
        return None;
    }

    let base_path = base.path().trim_end_matches('/');
    let target_path = target.path().trim_end_matches('/');

    let remaining = target_path.strip_prefix(base_path)?;
    if remaining.is_empty() {
        return Some(0);
    }
    // "/blogger" shares a prefix with "/blog" but is a sibling, not a child
    if !remaining.starts_with('/') {
        return None;
    }

    Some(remaining.split('/').filter(|s| !s.is_empty()).count())
}

/// Unwrap a search-engine redirect such as `/url?q=https%3A%2F%2Fexample.com&sa=U`.
pub fn unwrap_search_redirect(href: &str) -> Option<String> {
    let query = href.strip_prefix("/url?")?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
}

pub fn is_excluded_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    EXCLUDED_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}

/// True for absolute http(s) URLs that do not point back at the search engine.
pub fn is_result_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => parsed.host_str().is_some_and(|host| !is_excluded_host(host)),
        Err(_) => false,
    }
}
