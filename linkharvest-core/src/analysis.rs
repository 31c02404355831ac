//! End-of-session aggregation over completed pages.
//!
//! Nothing here runs while the crawl is in progress; every function is a pure
//! fold over the finished page list.

use linkharvest_scanner::{OrderedCounter, PageRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TOP_AGGREGATE_KEYWORDS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

/// A keyword's totals across every page it was ranked on.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSummary {
    pub word: String,
    pub total_count: usize,
    pub average_density: f64,
    pub pages_found_on: usize,
}

/// A phrase's totals across every page it was ranked on.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseSummary {
    pub phrase: String,
    pub total_count: usize,
    pub pages_found_on: usize,
}

/// Sum each page's ranked keyword counts into a global top-50.
pub fn aggregate_keywords(pages: &[PageRecord]) -> Vec<KeywordCount> {
    let mut counter = OrderedCounter::new();
    for keywords in pages.iter().filter_map(|p| p.keyword_density.as_ref()) {
        for keyword in keywords {
            counter.add(&keyword.word, keyword.count);
        }
    }

    counter
        .ranked()
        .into_iter()
        .take(TOP_AGGREGATE_KEYWORDS)
        .map(|(word, count)| KeywordCount { word, count })
        .collect()
}

/// Per-keyword totals, average density and page spread, ranked by total.
pub fn summarize_keywords(pages: &[PageRecord], limit: usize) -> Vec<KeywordSummary> {
    let mut totals = OrderedCounter::new();
    let mut spread: HashMap<String, (usize, f64)> = HashMap::new();

    for keywords in pages.iter().filter_map(|p| p.keyword_density.as_ref()) {
        for keyword in keywords {
            totals.add(&keyword.word, keyword.count);
            let entry = spread.entry(keyword.word.clone()).or_default();
            entry.0 += 1;
            entry.1 += keyword.density_value();
        }
    }

    totals
        .ranked()
        .into_iter()
        .take(limit)
        .map(|(word, total_count)| {
            let (pages_found_on, density_sum) = spread.get(&word).copied().unwrap_or((0, 0.0));
            let average_density = if pages_found_on == 0 {
                0.0
            } else {
                density_sum / pages_found_on as f64
            };
            KeywordSummary {
                word,
                total_count,
                average_density,
                pages_found_on,
            }
        })
        .collect()
}

/// Aggregated (bigrams, trigrams), each ranked by total count.
pub fn summarize_phrases(pages: &[PageRecord], limit: usize) -> (Vec<PhraseSummary>, Vec<PhraseSummary>) {
    let ngrams: Vec<_> = pages.iter().filter_map(|p| p.ngram_analysis.as_ref()).collect();

    let bigrams = summarize(ngrams.iter().map(|n| &n.bigrams), limit);
    let trigrams = summarize(ngrams.iter().map(|n| &n.trigrams), limit);
    (bigrams, trigrams)
}

fn summarize<'a, I>(per_page: I, limit: usize) -> Vec<PhraseSummary>
where
    I: Iterator<Item = &'a Vec<linkharvest_scanner::PhraseCount>>,
{
    let mut totals = OrderedCounter::new();
    let mut pages = OrderedCounter::new();

    for phrases in per_page {
        for phrase in phrases {
            totals.add(&phrase.phrase, phrase.count);
            pages.add(&phrase.phrase, 1);
        }
    }

    let page_counts: HashMap<String, usize> = pages.ranked().into_iter().collect();
    totals
        .ranked()
        .into_iter()
        .take(limit)
        .map(|(phrase, total_count)| PhraseSummary {
            pages_found_on: page_counts.get(&phrase).copied().unwrap_or(0),
            phrase,
            total_count,
        })
        .collect()
}
