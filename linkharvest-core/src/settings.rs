//! Crawl configuration.
//!
//! Field names follow the camelCase option names a settings UI produces, so a
//! saved settings object deserialises directly.

use crate::error::{CrawlError, Result};
use linkharvest_scanner::ExtractOptions;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub const DEFAULT_MAX_PAGES: usize = 50;

/// How seed URLs are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UrlMode {
    /// Crawl outward from each seed within its scope.
    #[default]
    Single,
    /// Fetch exactly the given URLs, never following links.
    List,
    /// Seeds are search queries or a search results page.
    Google,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GoogleMode {
    /// `urls[0]` is a search results page to harvest.
    CurrentPage,
    /// Every entry of `urls` is a query to search for.
    #[default]
    Queries,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    None,
    Contains,
    Regex,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlFilter {
    pub mode: FilterMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl UrlFilter {
    pub fn contains(text: impl Into<String>) -> Self {
        Self {
            mode: FilterMode::Contains,
            contains: Some(text.into()),
            pattern: None,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            mode: FilterMode::Regex,
            contains: None,
            pattern: Some(pattern.into()),
        }
    }

    /// Compile into a matcher. An empty needle or pattern matches everything;
    /// a pattern that does not compile is an error for the caller to recover.
    pub fn compile(&self) -> Result<LinkFilter> {
        let filter = match self.mode {
            FilterMode::None => LinkFilter::All,
            FilterMode::Contains => match self.contains.as_deref() {
                Some(text) if !text.is_empty() => LinkFilter::Contains(text.to_lowercase()),
                _ => LinkFilter::All,
            },
            FilterMode::Regex => match self.pattern.as_deref() {
                Some(pattern) if !pattern.is_empty() => LinkFilter::Pattern(Regex::new(pattern)?),
                _ => LinkFilter::All,
            },
        };
        Ok(filter)
    }

    /// Human-readable form for report headers, `None` when no filter applies.
    pub fn describe(&self) -> Option<String> {
        match self.mode {
            FilterMode::None => None,
            FilterMode::Contains => self
                .contains
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(|t| format!("contains \"{}\"", t)),
            FilterMode::Regex => self
                .pattern
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| format!("regex /{}/", p)),
        }
    }
}

/// A compiled URL filter applied to discovered links before they are queued.
#[derive(Debug, Clone)]
pub enum LinkFilter {
    All,
    /// Case-insensitive substring; the needle is stored lower-cased.
    Contains(String),
    Pattern(Regex),
}

impl LinkFilter {
    pub fn matches(&self, url: &str) -> bool {
        match self {
            LinkFilter::All => true,
            LinkFilter::Contains(needle) => url.to_lowercase().contains(needle),
            LinkFilter::Pattern(re) => re.is_match(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrawlSettings {
    pub urls: Vec<String>,
    pub url_mode: UrlMode,
    pub google_mode: GoogleMode,
    pub max_depth: usize,
    pub max_pages: usize,
    pub extract_html: bool,
    pub extract_text: bool,
    pub extract_metadata: bool,
    pub crawl_sitemap: bool,
    pub url_filter: UrlFilter,
    pub delay_ms: u64,
    pub save_individual_files: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    pub keyword_density: bool,
    pub broken_link_checker: bool,
    pub csv_export: bool,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            url_mode: UrlMode::default(),
            google_mode: GoogleMode::default(),
            max_depth: 0,
            max_pages: DEFAULT_MAX_PAGES,
            extract_html: false,
            extract_text: true,
            extract_metadata: false,
            crawl_sitemap: false,
            url_filter: UrlFilter::default(),
            delay_ms: 0,
            save_individual_files: false,
            webhook_url: None,
            keyword_density: false,
            broken_link_checker: false,
            csv_export: false,
        }
    }
}

impl CrawlSettings {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject settings that cannot start a crawl.
    ///
    /// Seeds must be absolute http(s) URLs, except in Google query mode where
    /// they are free-text queries.
    pub fn validate(&self) -> Result<()> {
        if self.urls.iter().all(|u| u.trim().is_empty()) {
            return Err(CrawlError::InvalidSettings("no URLs provided".to_string()));
        }

        if self.url_mode == UrlMode::Google && self.google_mode == GoogleMode::Queries {
            return Ok(());
        }

        if self.url_mode == UrlMode::Google {
            // only the results page is fetched
            return check_http_url(&self.urls[0]);
        }

        self.urls.iter().try_for_each(|u| check_http_url(u))
    }

    /// Progress total: every base may use its full page quota.
    pub fn total_estimate(&self) -> usize {
        self.urls.len().saturating_mul(self.max_pages)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            extract_text: self.extract_text,
            extract_metadata: self.extract_metadata,
            keyword_density: self.keyword_density,
            broken_link_checker: self.broken_link_checker,
        }
    }

    /// Whether discovered links are followed at all.
    pub fn follows_links(&self) -> bool {
        self.url_mode != UrlMode::List
    }
}

fn check_http_url(candidate: &str) -> Result<()> {
    let parsed = Url::parse(candidate.trim())
        .map_err(|e| CrawlError::InvalidSettings(format!("invalid URL '{}': {}", candidate, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(CrawlError::InvalidSettings(format!(
            "invalid URL '{}': only http and https URLs can be crawled",
            candidate
        )));
    }
    Ok(())
}
