//! Completion notification posted to a user-supplied webhook.

use crate::analysis::KeywordCount;
use crate::error::Result;
use crate::session::CrawlSession;
use linkharvest_scanner::PageFetcher;
use serde::{Deserialize, Serialize};

pub const WEBHOOK_TOP_KEYWORDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookSettings {
    pub max_depth: usize,
    pub max_pages: usize,
    pub sitemap_crawl: bool,
    pub keyword_analysis: bool,
    pub broken_link_check: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookSummary {
    pub timestamp: String,
    pub urls_crawled: Vec<String>,
    pub pages_processed: usize,
    pub total_pages_found: usize,
    pub broken_links_found: usize,
    pub crawl_settings: WebhookSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_keywords: Option<Vec<KeywordCount>>,
}

impl WebhookSummary {
    pub fn from_session(session: &CrawlSession) -> Self {
        let settings = &session.settings;
        let top_keywords = (!session.aggregate_keywords.is_empty()).then(|| {
            session
                .aggregate_keywords
                .iter()
                .take(WEBHOOK_TOP_KEYWORDS)
                .cloned()
                .collect()
        });

        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            urls_crawled: settings.urls.clone(),
            pages_processed: session.processed,
            total_pages_found: session.total_estimate(),
            broken_links_found: session.broken_links.len(),
            crawl_settings: WebhookSettings {
                max_depth: settings.max_depth,
                max_pages: settings.max_pages,
                sitemap_crawl: settings.crawl_sitemap,
                keyword_analysis: settings.keyword_density,
                broken_link_check: settings.broken_link_checker,
            },
            top_keywords,
        }
    }
}

/// POST the summary. Non-2xx answers are errors for the caller to log.
pub async fn send_webhook(
    fetcher: &PageFetcher,
    webhook_url: &str,
    summary: &WebhookSummary,
) -> Result<()> {
    fetcher.post_json(webhook_url, summary).await?;
    Ok(())
}
