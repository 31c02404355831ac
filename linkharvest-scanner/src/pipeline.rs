//! Fetch one URL and turn it into a [`PageRecord`].

use crate::analytics::{analyze_links, keyword_density, ngram_analysis, seo_analysis};
use crate::error::Result;
use crate::extract::{self, extract_structured_text};
use crate::fetcher::PageFetcher;
use crate::result::{BrokenLinkRecord, PageRecord};
use chrono::Utc;
use tracing::debug;
use url::Url;

/// Existence checks are capped per page to bound request volume.
pub const MAX_LINK_CHECKS: usize = 10;

/// Which optional extraction stages run for each page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub extract_text: bool,
    pub extract_metadata: bool,
    pub keyword_density: bool,
    pub broken_link_checker: bool,
}

/// A fetched page and any broken links found while checking its anchors.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub record: PageRecord,
    pub broken_links: Vec<BrokenLinkRecord>,
}

/// Fetch `url` and run every enabled extraction stage over it.
///
/// Fails with [`crate::ScanError::Http`] for non-2xx responses,
/// [`crate::ScanError::InvalidUrl`] for targets that are not http(s) and
/// [`crate::ScanError::Network`] on transport failure. Link checks never fail
/// the page; their failures come back in [`PageOutcome::broken_links`].
pub async fn fetch_and_extract(
    fetcher: &PageFetcher,
    url: &str,
    base_url: &str,
    depth: usize,
    options: &ExtractOptions,
) -> Result<PageOutcome> {
    let html = fetcher.get_text(url).await?;

    let broken_links = if options.broken_link_checker {
        check_links(fetcher, &html, url).await
    } else {
        Vec::new()
    };

    let record = extract_page(url, base_url, depth, html, options);
    Ok(PageOutcome {
        record,
        broken_links,
    })
}

/// Build a record from HTML that has already been fetched.
pub fn extract_page(
    url: &str,
    base_url: &str,
    depth: usize,
    html: String,
    options: &ExtractOptions,
) -> PageRecord {
    let title = extract::extract_title(&html);
    let seo = seo_analysis(&html, &title);
    let links = analyze_links(&html, url);

    let text = options
        .extract_text
        .then(|| extract_structured_text(&html, url));

    // density needs text to count over
    let (keywords, ngrams) = match text.as_deref() {
        Some(text) if options.keyword_density && !text.is_empty() => {
            (Some(keyword_density(text)), Some(ngram_analysis(text)))
        }
        _ => (None, None),
    };

    let metadata = options
        .extract_metadata
        .then(|| extract::extract_metadata(&html));

    PageRecord {
        url: url.to_string(),
        base_url: base_url.to_string(),
        timestamp: Utc::now(),
        depth,
        title,
        raw_html: html,
        seo_analysis: seo,
        internal_links: links.internal,
        external_links: links.external,
        link_stats: links.stats,
        text,
        metadata,
        keyword_density: keywords,
        ngram_analysis: ngrams,
    }
}

/// HEAD-check the first [`MAX_LINK_CHECKS`] http(s) links of a page, one at
/// a time, and report the ones that fail.
pub async fn check_links(fetcher: &PageFetcher, html: &str, page_url: &str) -> Vec<BrokenLinkRecord> {
    let Ok(page) = Url::parse(page_url) else {
        return Vec::new();
    };

    let targets: Vec<String> = extract::extract_hrefs(html)
        .iter()
        .filter_map(|href| page.join(href).ok())
        .filter(|target| matches!(target.scheme(), "http" | "https"))
        .map(|target| target.to_string())
        .take(MAX_LINK_CHECKS)
        .collect();

    let mut broken = Vec::new();
    for target in targets {
        match fetcher.head_status(&target).await {
            Ok(status) if (200..300).contains(&status) => {}
            Ok(status) => {
                debug!("Broken link {} ({}) on {}", target, status, page_url);
                broken.push(BrokenLinkRecord::with_status(
                    target,
                    Some(page_url.to_string()),
                    status,
                ));
            }
            Err(e) => {
                debug!("Link check failed for {}: {}", target, e);
                broken.push(BrokenLinkRecord::with_error(
                    target,
                    Some(page_url.to_string()),
                    e.to_string(),
                ));
            }
        }
    }

    broken
}
