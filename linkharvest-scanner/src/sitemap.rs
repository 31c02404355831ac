//! Sitemap discovery and expansion.
//!
//! A base URL's sitemap is looked for at a fixed list of candidate paths. An
//! index of sitemaps is followed exactly one level deep.

use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::normalize::decode_entities;
use flate2::read::GzDecoder;
use regex::Regex;
use std::io::Read;
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const SITEMAP_CANDIDATES: &[&str] = &["sitemap.xml", "sitemap_index.xml", "sitemap.xml.gz"];

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

static INDEX_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<sitemap>.*?<loc>(.*?)</loc>.*?</sitemap>").unwrap());
static LOC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<loc>(.*?)</loc>").unwrap());

/// Which candidate produced URLs for a base, and the URLs themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapDiscovery {
    pub sitemap_url: Option<String>,
    pub urls: Vec<String>,
}

/// Candidate sitemap locations for a base URL, in lookup order.
pub fn candidate_urls(base_url: &str) -> Vec<String> {
    let root = base_url.trim_end_matches('/');
    SITEMAP_CANDIDATES
        .iter()
        .map(|name| format!("{}/{}", root, name))
        .collect()
}

pub fn is_sitemap_index(xml: &str) -> bool {
    xml.contains("<sitemapindex")
}

/// `<loc>` entries of the `<sitemap>` elements in an index.
pub fn parse_index_entries(xml: &str) -> Vec<String> {
    collect_locs(&INDEX_ENTRY_RE, xml)
}

/// Every `<loc>` entry in a URL-set sitemap.
pub fn parse_url_entries(xml: &str) -> Vec<String> {
    collect_locs(&LOC_RE, xml)
}

fn collect_locs(re: &Regex, xml: &str) -> Vec<String> {
    re.captures_iter(xml)
        .map(|caps| decode_entities(caps[1].trim()))
        .filter(|loc| !loc.is_empty())
        .collect()
}

/// Decode a sitemap body, inflating it first when it is gzip-compressed.
pub fn decode_body(bytes: &[u8]) -> Result<String> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut xml = String::new();
        GzDecoder::new(bytes).read_to_string(&mut xml)?;
        return Ok(xml);
    }
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

async fn fetch_sitemap(fetcher: &PageFetcher, url: &str) -> Result<String> {
    let bytes = fetcher.get_bytes(url).await?;
    decode_body(&bytes)
}

/// Try each candidate in order and return the first that yields entries.
///
/// Never fails: unreachable candidates and unreadable sub-sitemaps are
/// skipped, and total failure is an empty discovery.
pub async fn discover_sitemap(fetcher: &PageFetcher, base_url: &str) -> SitemapDiscovery {
    for candidate in candidate_urls(base_url) {
        let xml = match fetch_sitemap(fetcher, &candidate).await {
            Ok(xml) => xml,
            Err(e) => {
                debug!("No sitemap at {}: {}", candidate, e);
                continue;
            }
        };

        let urls = if is_sitemap_index(&xml) {
            expand_index(fetcher, &xml).await
        } else {
            parse_url_entries(&xml)
        };

        if urls.is_empty() {
            debug!("Sitemap {} has no entries, trying next candidate", candidate);
            continue;
        }

        debug!("Sitemap {} yielded {} URLs", candidate, urls.len());
        return SitemapDiscovery {
            sitemap_url: Some(candidate),
            urls,
        };
    }

    SitemapDiscovery::default()
}

/// Flat list of page URLs from a base URL's sitemap.
pub async fn resolve_sitemap(fetcher: &PageFetcher, base_url: &str) -> Vec<String> {
    discover_sitemap(fetcher, base_url).await.urls
}

async fn expand_index(fetcher: &PageFetcher, xml: &str) -> Vec<String> {
    let mut urls = Vec::new();

    for sub_sitemap in parse_index_entries(xml) {
        match fetch_sitemap(fetcher, &sub_sitemap).await {
            // nested indexes are not followed
            Ok(sub_xml) => urls.extend(parse_url_entries(&sub_xml)),
            Err(e) => warn!("Failed to fetch sub-sitemap {}: {}", sub_sitemap, e),
        }
    }

    urls
}
