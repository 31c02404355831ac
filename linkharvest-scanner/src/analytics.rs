//! Per-page analytics: keyword density, phrase frequency, SEO heuristics and
//! link statistics.
//!
//! Every ranking here is stable: counts are accumulated in first-seen order
//! and sorted by descending count, so equal counts keep document order.

use crate::extract::{self, Anchor};
use crate::normalize::{decode_entities, is_same_origin, resolve_href};
use crate::result::LinkInfo;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use url::Url;

pub const TOP_KEYWORDS: usize = 20;
pub const TOP_PHRASES: usize = 10;
pub const TOP_DUPLICATE_ANCHORS: usize = 5;

pub const TITLE_MIN_CHARS: usize = 30;
pub const TITLE_MAX_CHARS: usize = 60;
pub const DESCRIPTION_MIN_CHARS: usize = 120;
pub const DESCRIPTION_MAX_CHARS: usize = 160;

const NO_ANCHOR_TEXT: &str = "[No anchor text]";

const KEYWORD_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "up", "about", "into", "through", "during", "before", "after", "above", "below",
    "between", "under", "again", "further", "then", "once", "here", "there", "when", "where",
    "why", "how", "all", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "can", "will", "just",
    "should", "could", "would", "may", "might", "must", "shall", "now", "is", "am", "are", "was",
    "were", "be", "have", "has", "had", "do", "does", "did", "this", "that", "these", "those",
    "i", "you", "he", "she", "it", "we", "they", "them", "their", "what", "which", "who", "whom",
    "myself", "yourself", "himself", "herself", "itself", "ourselves", "themselves", "its",
    "our", "your", "his", "her", "my", "me", "him", "us",
];

const PHRASE_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "up", "about", "into", "through", "during", "is", "am", "are", "was", "were", "be",
    "have", "has", "had", "do", "does", "did", "will", "would", "could", "should", "may",
    "might", "must", "can", "this", "that", "these", "those", "i", "you", "he", "she", "it",
    "we", "they", "them", "their", "what", "which", "who",
];

static KEYWORD_STOPS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| KEYWORD_STOP_WORDS.iter().copied().collect());
static PHRASE_STOPS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| PHRASE_STOP_WORDS.iter().copied().collect());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordDensity {
    pub word: String,
    pub count: usize,
    /// Share of all counted tokens, e.g. `"3.45%"`.
    pub density: String,
}

impl KeywordDensity {
    /// The numeric value of [`Self::density`], `0.0` when unparsable.
    pub fn density_value(&self) -> f64 {
        self.density
            .trim_end_matches('%')
            .parse::<f64>()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseCount {
    pub phrase: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NgramAnalysis {
    pub bigrams: Vec<PhraseCount>,
    pub trigrams: Vec<PhraseCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoAnalysis {
    pub title_issues: Vec<String>,
    pub meta_description_issues: Vec<String>,
    pub heading_issues: Vec<String>,
    pub title_length: usize,
    pub meta_description_length: usize,
    pub h1_count: usize,
}

impl SeoAnalysis {
    pub fn issue_count(&self) -> usize {
        self.title_issues.len() + self.meta_description_issues.len() + self.heading_issues.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorCount {
    pub text: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    pub internal_count: usize,
    pub external_count: usize,
    /// External-to-internal ratio with two decimals, or `"N/A"`.
    pub ratio: String,
    pub anchor_text_diversity: usize,
    pub duplicate_anchors: Vec<AnchorCount>,
}

impl Default for LinkStats {
    fn default() -> Self {
        Self {
            internal_count: 0,
            external_count: 0,
            ratio: "N/A".to_string(),
            anchor_text_diversity: 0,
            duplicate_anchors: Vec::new(),
        }
    }
}

/// Links of one page split by origin, with their statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkAnalysis {
    pub internal: Vec<LinkInfo>,
    pub external: Vec<LinkInfo>,
    pub stats: LinkStats,
}

/// Counts keys in first-seen order.
#[derive(Debug, Default)]
pub struct OrderedCounter {
    order: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl OrderedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str, amount: usize) {
        match self.index.get(key) {
            Some(&slot) => self.order[slot].1 += amount,
            None => {
                self.index.insert(key.to_string(), self.order.len());
                self.order.push((key.to_string(), amount));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries sorted by descending count; ties keep first-seen order.
    pub fn ranked(self) -> Vec<(String, usize)> {
        let mut entries = self.order;
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

/// Lower-case the text and split it into alphanumeric tokens.
fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Two decimal places with halves rounded away from zero, so `0.125` shows
/// as `0.13` rather than the `0.12` of `{:.2}`.
pub fn fixed_2dp(value: f64) -> String {
    format!("{:.2}", (value * 100.0).round() / 100.0)
}

pub fn keyword_density(text: &str) -> Vec<KeywordDensity> {
    let words: Vec<String> = tokenize(text)
        .into_iter()
        .filter(|w| w.len() > 2 && !KEYWORD_STOPS.contains(w.as_str()))
        .collect();

    let total = words.len();
    let mut counter = OrderedCounter::new();
    for word in &words {
        counter.add(word, 1);
    }

    counter
        .ranked()
        .into_iter()
        .take(TOP_KEYWORDS)
        .map(|(word, count)| KeywordDensity {
            density: format!("{}%", fixed_2dp(count as f64 / total as f64 * 100.0)),
            word,
            count,
        })
        .collect()
}

pub fn ngram_analysis(text: &str) -> NgramAnalysis {
    let words: Vec<String> = tokenize(text).into_iter().filter(|w| w.len() > 2).collect();
    let is_stop = |w: &String| PHRASE_STOPS.contains(w.as_str());

    let mut bigrams = OrderedCounter::new();
    for pair in words.windows(2) {
        if !is_stop(&pair[0]) && !is_stop(&pair[1]) {
            bigrams.add(&pair.join(" "), 1);
        }
    }

    let mut trigrams = OrderedCounter::new();
    for triple in words.windows(3) {
        if triple.iter().any(|w| !is_stop(w)) {
            trigrams.add(&triple.join(" "), 1);
        }
    }

    NgramAnalysis {
        bigrams: top_repeated(bigrams),
        trigrams: top_repeated(trigrams),
    }
}

fn top_repeated(counter: OrderedCounter) -> Vec<PhraseCount> {
    counter
        .ranked()
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .take(TOP_PHRASES)
        .map(|(phrase, count)| PhraseCount { phrase, count })
        .collect()
}

/// Title, meta description and H1 checks for one page.
pub fn seo_analysis(html: &str, title: &str) -> SeoAnalysis {
    let description = extract::extract_meta_content(html, "description");
    let title_length = title.chars().count();
    let meta_description_length = description.chars().count();
    let h1_count = extract::count_h1(html);

    let mut analysis = SeoAnalysis {
        title_length,
        meta_description_length,
        h1_count,
        ..Default::default()
    };

    if title.is_empty() {
        analysis.title_issues.push("Missing title tag".to_string());
    } else if title_length < TITLE_MIN_CHARS {
        analysis.title_issues.push(format!(
            "Title too short ({} chars, recommended: {}-{})",
            title_length, TITLE_MIN_CHARS, TITLE_MAX_CHARS
        ));
    } else if title_length > TITLE_MAX_CHARS {
        analysis.title_issues.push(format!(
            "Title too long ({} chars, recommended: {}-{})",
            title_length, TITLE_MIN_CHARS, TITLE_MAX_CHARS
        ));
    }

    if description.is_empty() {
        analysis
            .meta_description_issues
            .push("Missing meta description".to_string());
    } else if meta_description_length < DESCRIPTION_MIN_CHARS {
        analysis.meta_description_issues.push(format!(
            "Meta description too short ({} chars, recommended: {}-{})",
            meta_description_length, DESCRIPTION_MIN_CHARS, DESCRIPTION_MAX_CHARS
        ));
    } else if meta_description_length > DESCRIPTION_MAX_CHARS {
        analysis.meta_description_issues.push(format!(
            "Meta description too long ({} chars, recommended: {}-{})",
            meta_description_length, DESCRIPTION_MIN_CHARS, DESCRIPTION_MAX_CHARS
        ));
    }

    match h1_count {
        0 => analysis.heading_issues.push("Missing H1 tag".to_string()),
        1 => {}
        n => analysis
            .heading_issues
            .push(format!("Multiple H1 tags found ({})", n)),
    }

    analysis
}

/// Classify a page's anchors as internal or external and compute link stats.
pub fn analyze_links(html: &str, page_url: &str) -> LinkAnalysis {
    let Ok(page) = Url::parse(page_url) else {
        return LinkAnalysis::default();
    };
    analyze_anchors(&extract::extract_anchors(html), &page)
}

pub fn analyze_anchors(anchors: &[Anchor], page: &Url) -> LinkAnalysis {
    let mut internal = Vec::new();
    let mut external = Vec::new();
    let mut internal_anchors = OrderedCounter::new();

    for anchor in anchors {
        let Some(target) = resolve_href(page, &anchor.href) else {
            continue;
        };

        let decoded = decode_entities(&anchor.text);
        let info = LinkInfo {
            url: target.to_string(),
            anchor_text: if decoded.is_empty() {
                NO_ANCHOR_TEXT.to_string()
            } else {
                decoded
            },
        };

        if is_same_origin(page, &target) {
            internal_anchors.add(&anchor.text.to_lowercase(), 1);
            internal.push(info);
        } else {
            external.push(info);
        }
    }

    let ratio = if internal.is_empty() {
        "N/A".to_string()
    } else {
        fixed_2dp(external.len() as f64 / internal.len() as f64)
    };
    let anchor_text_diversity = internal_anchors.len();
    let duplicate_anchors = internal_anchors
        .ranked()
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .take(TOP_DUPLICATE_ANCHORS)
        .map(|(text, count)| AnchorCount { text, count })
        .collect();

    LinkAnalysis {
        stats: LinkStats {
            internal_count: internal.len(),
            external_count: external.len(),
            ratio,
            anchor_text_diversity,
            duplicate_anchors,
        },
        internal,
        external,
    }
}
