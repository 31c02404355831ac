//! Sitemap-driven extraction: fetch every page a site's sitemap lists instead
//! of following links.

use crate::crawl::Harvester;
use crate::error::{CrawlError, Result};
use crate::output::DownloadSink;
use crate::report::sitemap_report;
use crate::session::FetchFailure;
use crate::settings::CrawlSettings;
use chrono::Utc;
use linkharvest_scanner::{
    BrokenLinkRecord, PageFetcher, PageRecord, discover_sitemap, fetch_and_extract,
};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// What sitemap discovery found for one base URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseSitemap {
    pub base_url: String,
    pub sitemap_url: Option<String>,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SitemapValidation {
    pub bases: Vec<BaseSitemap>,
    pub total_urls: usize,
    pub valid_sitemaps: usize,
}

impl SitemapValidation {
    /// Every discovered page URL, base by base.
    pub fn all_urls(&self) -> Vec<(String, String)> {
        self.bases
            .iter()
            .flat_map(|b| b.urls.iter().map(|u| (b.base_url.clone(), u.clone())))
            .collect()
    }
}

/// Look for a sitemap under every base URL.
pub async fn validate_sitemaps(fetcher: &PageFetcher, urls: &[String]) -> SitemapValidation {
    let mut validation = SitemapValidation::default();

    for base_url in urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
        let discovery = discover_sitemap(fetcher, base_url).await;
        if discovery.sitemap_url.is_some() {
            validation.valid_sitemaps += 1;
            validation.total_urls += discovery.urls.len();
        }
        validation.bases.push(BaseSitemap {
            base_url: base_url.to_string(),
            sitemap_url: discovery.sitemap_url,
            urls: discovery.urls,
        });
    }

    info!(
        "Found {} sitemaps listing {} URLs across {} base URLs",
        validation.valid_sitemaps,
        validation.total_urls,
        validation.bases.len()
    );
    validation
}

/// Outcome of a sitemap extraction run.
#[derive(Debug, Clone)]
pub struct SitemapExtraction {
    pub validation: SitemapValidation,
    pub pages: Vec<PageRecord>,
    pub broken_links: Vec<BrokenLinkRecord>,
    pub failures: Vec<FetchFailure>,
    pub processed: usize,
}

impl Harvester {
    pub async fn validate_sitemaps(&self, urls: &[String]) -> SitemapValidation {
        validate_sitemaps(&self.fetcher, urls).await
    }

    /// Fetch the first `max_pages` sitemap URLs across all bases and deliver a
    /// single extraction report.
    pub async fn extract_sitemap_content(
        &self,
        settings: CrawlSettings,
        sink: &dyn DownloadSink,
    ) -> Result<SitemapExtraction> {
        let guard = self.begin_run()?;

        if let Err(e) = settings.validate() {
            return Err(self.finish_failed(guard, 0, 0, e));
        }

        self.action("Validating sitemaps");
        let validation = validate_sitemaps(&self.fetcher, &settings.urls).await;
        if validation.total_urls == 0 {
            let error = CrawlError::InvalidSettings("No valid sitemap URLs found".to_string());
            return Err(self.finish_failed(guard, 0, 0, error));
        }

        let targets: Vec<(String, String)> = validation
            .all_urls()
            .into_iter()
            .take(settings.max_pages)
            .collect();
        let total = targets.len();
        let options = settings.extract_options();
        let delay = Duration::from_millis(settings.delay_ms);

        let mut extraction = SitemapExtraction {
            validation,
            pages: Vec::new(),
            broken_links: Vec::new(),
            failures: Vec::new(),
            processed: 0,
        };
        let mut stopped = None;

        for (base_url, url) in &targets {
            if let Err(e) = self.check_cancelled() {
                stopped = Some(e);
                break;
            }

            self.action(format!(
                "Extracting content from {} ({}/{})",
                url,
                extraction.processed + 1,
                total
            ));

            match fetch_and_extract(&self.fetcher, url, base_url, 0, &options).await {
                Ok(outcome) => {
                    extraction.broken_links.extend(outcome.broken_links);
                    extraction.pages.push(outcome.record);
                }
                Err(e) => {
                    warn!("Error processing {}: {}", url, e);
                    extraction.failures.push(FetchFailure {
                        url: url.clone(),
                        base_url: base_url.clone(),
                        error: e.to_string(),
                    });
                }
            }
            extraction.processed += 1;
            self.progress(extraction.processed, total, format!("Processed {}", url));

            if !delay.is_zero() && extraction.processed < total {
                tokio::time::sleep(delay).await;
            }
        }

        if stopped.is_none() || !extraction.pages.is_empty() {
            let artifact = sitemap_report(
                &settings,
                &extraction.pages,
                &extraction.broken_links,
                &extraction.validation,
                &Utc::now(),
            );
            if let Err(e) = sink.deliver(&artifact) {
                return Err(self.finish_failed(guard, extraction.processed, total, e));
            }
        }

        if let Some(e) = stopped {
            return Err(self.finish_failed(guard, extraction.processed, total, e));
        }

        guard.complete();
        self.progress(extraction.processed, total, "Sitemap extraction complete");
        self.action(format!(
            "Extracted content from {} of {} pages",
            extraction.pages.len(),
            total
        ));
        Ok(extraction)
    }
}
