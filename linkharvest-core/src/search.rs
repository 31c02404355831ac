//! Turning search queries or a search results page into crawlable URLs.

use crate::error::{CrawlError, Result};
use crate::settings::{CrawlSettings, GoogleMode};
use linkharvest_scanner::PageFetcher;
use linkharvest_scanner::normalize::{
    decode_entities, is_result_url, strip_query_and_fragment, unwrap_search_redirect,
};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.google.com/search";

static HREF_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href\s*=\s*"([^"]+)""#).unwrap());

/// Result URLs on a search results page, without query strings or fragments,
/// deduplicated in first-seen order.
pub fn extract_result_urls(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for caps in HREF_ATTR_RE.captures_iter(html) {
        let href = decode_entities(&caps[1]);
        let target = if href.starts_with("/url?") {
            match unwrap_search_redirect(&href) {
                Some(target) => target,
                None => continue,
            }
        } else {
            href
        };

        if !is_result_url(&target) {
            continue;
        }

        let cleaned = strip_query_and_fragment(&target);
        if seen.insert(cleaned.clone()) {
            urls.push(cleaned);
        }
    }

    urls
}

/// Resolve Google-mode seeds into the URLs to crawl.
///
/// `notify` receives human-readable progress for each request.
pub async fn resolve_search_urls<F>(
    fetcher: &PageFetcher,
    settings: &CrawlSettings,
    endpoint: &str,
    notify: F,
) -> Result<Vec<String>>
where
    F: Fn(String),
{
    let mut found = Vec::new();

    match settings.google_mode {
        GoogleMode::CurrentPage => {
            let page = settings.urls.first().ok_or(CrawlError::NoSearchResults)?;
            notify(format!("Fetching search results from {}", page));
            let html = fetcher.get_text(page).await?;
            found.extend(extract_result_urls(&html));
        }
        GoogleMode::Queries => {
            let queries: Vec<&str> = settings
                .urls
                .iter()
                .map(|q| q.trim())
                .filter(|q| !q.is_empty())
                .collect();

            for (i, query) in queries.iter().enumerate() {
                notify(format!("Searching for: {}", query));
                let html = fetcher.get_text_with_query(endpoint, &[("q", *query)]).await?;
                let results = extract_result_urls(&html);
                debug!("Query '{}' returned {} result URLs", query, results.len());
                found.extend(results);

                if settings.delay_ms > 0 && i + 1 < queries.len() {
                    tokio::time::sleep(Duration::from_millis(settings.delay_ms)).await;
                }
            }
        }
    }

    let mut seen = HashSet::new();
    found.retain(|url| seen.insert(url.clone()));

    info!("Resolved {} unique result URLs", found.len());
    notify(format!("Found {} unique result URLs to scrape", found.len()));

    if found.is_empty() {
        return Err(CrawlError::NoSearchResults);
    }
    Ok(found)
}
