//! Readable, structured text for a page: title, description, headings, main
//! content paragraphs and the links found inside the content region.

use super::{extract_meta_content, extract_title, strip_tags};
use crate::normalize::{decode_entities, is_same_origin, resolve_href};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Paragraphs this short are navigation crumbs or captions rather than content.
const MIN_PARAGRAPH_CHARS: usize = 20;

static FIRST_H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>.*?</h1\s*>").unwrap());

static BOILERPLATE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "nav", "header", "footer", "aside", "form"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b.*?</{tag}\s*>")).unwrap())
        .collect()
});

static END_MARKER_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)<footer[^>]*>",
        r#"(?i)<div[^>]*class=["'][^"']*footer[^"']*["']"#,
        r#"(?i)<div[^>]*id=["']footer["']"#,
        r#"(?i)<div[^>]*class=["'][^"']*comments[^"']*["']"#,
        r#"(?i)<div[^>]*id=["']comments["']"#,
        r#"(?i)<section[^>]*class=["'][^"']*footer[^"']*["']"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static HEADING_RES: LazyLock<Vec<(u8, Regex)>> = LazyLock::new(|| {
    (1..=6u8)
        .map(|level| {
            let pattern = format!(r"(?is)<h{level}\b[^>]*>(.*?)</h{level}\s*>");
            (level, Regex::new(&pattern).unwrap())
        })
        .collect()
});

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").unwrap());

static TEXT_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s+(?:[^>]*?\s+)?href\s*=\s*["']([^"']+)["'][^>]*>([^<]*)</a\s*>"#).unwrap()
});

/// Where the main content of a page is looked for, in priority order.
const CONTAINER_SELECTORS: &[&str] = &[
    "main",
    "article",
    "#content",
    ".content",
    "#main",
    ".main",
    "#main-content",
    ".main-content",
    ".post-content",
    ".entry-content",
    ".page-content",
];

/// A compiled content container.
///
/// Element containers yield their inner markup. Id and class containers
/// cannot be balanced with a pattern, so they run from the opening tag to the
/// end of the document and rely on the end markers for truncation.
struct Container {
    pattern: Regex,
    whole_element: bool,
}

impl Container {
    fn compile(selector: &str) -> Option<Self> {
        let (pattern, whole_element) = if let Some(id) = selector.strip_prefix('#') {
            (
                format!(r#"(?is)<[a-z][a-z0-9]*\b[^>]*\bid\s*=\s*["']{id}["'][^>]*>"#),
                false,
            )
        } else if let Some(class) = selector.strip_prefix('.') {
            (
                format!(
                    r#"(?is)<[a-z][a-z0-9]*\b[^>]*\bclass\s*=\s*["'](?:[^"']*\s)?{class}(?:\s[^"']*)?["'][^>]*>"#
                ),
                false,
            )
        } else {
            (
                format!(r"(?is)<{selector}\b[^>]*>(.*?)</{selector}\s*>"),
                true,
            )
        };
        Regex::new(&pattern).ok().map(|pattern| Container {
            pattern,
            whole_element,
        })
    }

    fn locate<'a>(&self, html: &'a str) -> Option<&'a str> {
        if self.whole_element {
            self.pattern
                .captures(html)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
        } else {
            self.pattern.find(html).map(|m| &html[m.end()..])
        }
    }
}

static CONTAINERS: LazyLock<Vec<Container>> = LazyLock::new(|| {
    CONTAINER_SELECTORS
        .iter()
        .filter_map(|selector| Container::compile(selector))
        .collect()
});

/// The pieces of a page's readable text before rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredText {
    pub title: String,
    pub description: String,
    pub headers: Vec<String>,
    pub content: Vec<String>,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
}

impl StructuredText {
    pub fn from_html(html: &str, page_url: &str) -> Self {
        let region = content_region(html);

        let mut text = StructuredText {
            title: extract_title(html),
            description: extract_meta_content(html, "description"),
            headers: headings(&region),
            content: paragraphs(&region),
            ..Default::default()
        };

        let Ok(page) = Url::parse(page_url) else {
            return text;
        };

        for caps in TEXT_LINK_RE.captures_iter(&region) {
            let label = decode_entities(caps[2].trim());
            if label.is_empty() {
                continue;
            }
            let Some(target) = resolve_href(&page, &caps[1]) else {
                continue;
            };
            let entry = format!("{} -> {}", label, target);
            if is_same_origin(&page, &target) {
                text.internal_links.push(entry);
            } else {
                text.external_links.push(entry);
            }
        }

        text
    }

    /// Render the sections that have content, separated by blank lines.
    pub fn render(&self) -> String {
        let mut out = String::new();

        if !self.title.is_empty() {
            out.push_str(&format!("Title: {}\n\n", self.title));
        }
        if !self.description.is_empty() {
            out.push_str(&format!("Description: {}\n\n", self.description));
        }
        if !self.headers.is_empty() {
            out.push_str(&format!("Headers:\n{}\n\n", self.headers.join("\n")));
        }
        if !self.content.is_empty() {
            out.push_str(&format!("Content:\n{}\n\n", self.content.join("\n\n")));
        }
        if !self.internal_links.is_empty() {
            out.push_str(&format!(
                "Internal Links:\n{}\n\n",
                self.internal_links.join("\n")
            ));
        }
        if !self.external_links.is_empty() {
            out.push_str(&format!(
                "External Links:\n{}",
                self.external_links.join("\n")
            ));
        }

        out.trim().to_string()
    }
}

/// Structured plain text for a page, rendered as a single string.
pub fn extract_structured_text(html: &str, page_url: &str) -> String {
    StructuredText::from_html(html, page_url).render()
}

/// Pick the part of the document that holds the main content and cut it at
/// the first footer or comments marker.
fn content_region(html: &str) -> String {
    let region = match FIRST_H1_RE.find(html) {
        Some(h1) => html[h1.start()..].to_string(),
        None => {
            let mut stripped = html.to_string();
            for re in BOILERPLATE_RES.iter() {
                stripped = re.replace_all(&stripped, "").into_owned();
            }
            CONTAINERS
                .iter()
                .find_map(|container| container.locate(&stripped))
                .map(str::to_string)
                .unwrap_or(stripped)
        }
    };

    let cut = END_MARKER_RES
        .iter()
        .filter_map(|re| re.find(&region).map(|m| m.start()))
        .filter(|&start| start > 0)
        .min();

    match cut {
        Some(end) => region[..end].to_string(),
        None => region,
    }
}

fn headings(region: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();

    for (level, re) in HEADING_RES.iter() {
        for caps in re.captures_iter(region) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let text = decode_entities(&strip_tags(inner.as_str()));
            if !text.is_empty() {
                found.push((whole.start(), format!("H{}: {}", level, text)));
            }
        }
    }

    found.sort_by_key(|(position, _)| *position);
    found.into_iter().map(|(_, heading)| heading).collect()
}

fn paragraphs(region: &str) -> Vec<String> {
    PARAGRAPH_RE
        .captures_iter(region)
        .map(|caps| decode_entities(&strip_tags(&caps[1])))
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect()
}
