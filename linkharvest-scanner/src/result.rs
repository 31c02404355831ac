use crate::analytics::{KeywordDensity, LinkStats, NgramAnalysis, SeoAnalysis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A link harvested from a page together with its visible anchor text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkInfo {
    pub url: String,
    pub anchor_text: String,
}

/// Meta tag content pulled from a page. Missing tags are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub description: String,
    pub keywords: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
}

impl PageMetadata {
    pub fn is_empty(&self) -> bool {
        self.description.is_empty()
            && self.keywords.is_empty()
            && self.og_title.is_empty()
            && self.og_description.is_empty()
            && self.og_image.is_empty()
    }
}

/// Everything extracted from one successfully fetched page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub base_url: String,
    pub timestamp: DateTime<Utc>,
    pub depth: usize,
    pub title: String,
    pub raw_html: String,
    pub seo_analysis: SeoAnalysis,
    pub internal_links: Vec<LinkInfo>,
    pub external_links: Vec<LinkInfo>,
    pub link_stats: LinkStats,
    pub text: Option<String>,
    pub metadata: Option<PageMetadata>,
    pub keyword_density: Option<Vec<KeywordDensity>>,
    pub ngram_analysis: Option<NgramAnalysis>,
}

impl PageRecord {
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokenLinkRecord {
    pub url: String,
    pub found_on: Option<String>,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

impl BrokenLinkRecord {
    pub fn with_status(url: String, found_on: Option<String>, status_code: u16) -> Self {
        Self {
            url,
            found_on,
            status_code: Some(status_code),
            error: None,
        }
    }

    pub fn with_error(url: String, found_on: Option<String>, error: String) -> Self {
        Self {
            url,
            found_on,
            status_code: None,
            error: Some(error),
        }
    }
}
