use crate::analysis::aggregate_keywords;
use crate::csv::csv_reports;
use crate::error::{CrawlError, Result};
use crate::frontier::Frontier;
use crate::output::DownloadSink;
use crate::report::{OutputContext, master_report, page_files};
use crate::search::{DEFAULT_SEARCH_ENDPOINT, resolve_search_urls};
use crate::session::{CrawlSession, CrawlState};
use crate::settings::{CrawlSettings, LinkFilter, UrlMode};
use crate::webhook::{WebhookSummary, send_webhook};
use chrono::Utc;
use linkharvest_scanner::extract::discover_links;
use linkharvest_scanner::normalize::{depth_from_base, normalize_url};
use linkharvest_scanner::{BrokenLinkRecord, PageFetcher, PageRecord, discover_sitemap, fetch_and_extract};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Progress notification: (processed, total estimate, status message).
pub type ProgressCallback = Arc<dyn Fn(usize, usize, String) + Send + Sync>;

/// Free-text "current action" notification.
pub type ActionCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Runs crawl sessions one at a time.
///
/// A harvester can be shared behind an `Arc`; a second `run_crawl` while one is
/// in flight fails with [`CrawlError::AlreadyRunning`] and leaves the running
/// session untouched.
pub struct Harvester {
    pub(crate) fetcher: PageFetcher,
    state: Arc<Mutex<CrawlState>>,
    progress_callback: Option<ProgressCallback>,
    action_callback: Option<ActionCallback>,
    cancel_flag: Arc<AtomicBool>,
    search_endpoint: String,
}

impl Harvester {
    pub fn new() -> Result<Self> {
        Ok(Self::with_fetcher(PageFetcher::new()?))
    }

    pub fn with_fetcher(fetcher: PageFetcher) -> Self {
        Self {
            fetcher,
            state: Arc::new(Mutex::new(CrawlState::Idle)),
            progress_callback: None,
            action_callback: None,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_action_callback(mut self, callback: ActionCallback) -> Self {
        self.action_callback = Some(callback);
        self
    }

    /// Share a flag that ends the current run when set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = flag;
        self
    }

    pub fn with_search_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.search_endpoint = endpoint.into();
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel_flag.clone()
    }

    pub(crate) fn progress(&self, processed: usize, total: usize, status: impl Into<String>) {
        if let Some(ref callback) = self.progress_callback {
            callback(processed, total, status.into());
        }
    }

    pub(crate) fn action(&self, text: impl Into<String>) {
        if let Some(ref callback) = self.action_callback {
            callback(text.into());
        }
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.cancel_flag.load(Ordering::Relaxed) {
            return Err(CrawlError::Cancelled);
        }
        Ok(())
    }

    /// Claim the harvester for one run.
    pub(crate) fn begin_run(&self) -> Result<RunGuard> {
        RunGuard::acquire(self.state.clone()).inspect(|_| {
            self.cancel_flag.store(false, Ordering::Relaxed);
        })
    }

    /// Crawl every base URL, produce outputs and return the finished session.
    ///
    /// Per-URL failures are recorded and never end the run. Pages completed
    /// before a fatal error or cancellation are still rendered and delivered
    /// before the error is returned.
    pub async fn run_crawl(
        &self,
        settings: CrawlSettings,
        sink: &dyn DownloadSink,
    ) -> Result<CrawlSession> {
        let guard = self.begin_run()?;
        self.progress(0, 0, "Starting crawl");

        if let Err(e) = settings.validate() {
            return Err(self.finish_failed(guard, 0, 0, e));
        }

        let mut session = CrawlSession::new(settings);
        info!(
            "Starting crawl session {} with {} seed(s)",
            session.id,
            session.settings.urls.len()
        );

        let result = self.execute(&mut session, sink).await;
        session.finished_at = Some(Utc::now());

        match result {
            Ok(()) => {
                info!(
                    "Crawl session {} complete: {} pages, {} failures, {} broken links",
                    session.id,
                    session.pages.len(),
                    session.failures.len(),
                    session.broken_links.len()
                );
                guard.complete();
                self.progress(session.processed, session.total_estimate(), "Crawl complete");
                self.action("Crawl completed successfully");
                Ok(session)
            }
            Err(e) => {
                let total = session.total_estimate();
                Err(self.finish_failed(guard, session.processed, total, e))
            }
        }
    }

    pub(crate) fn finish_failed(
        &self,
        guard: RunGuard,
        processed: usize,
        total: usize,
        error: CrawlError,
    ) -> CrawlError {
        warn!("Crawl failed: {}", error);
        guard.fail(error.to_string());
        self.progress(processed, total, error.to_string());
        error
    }

    async fn execute(&self, session: &mut CrawlSession, sink: &dyn DownloadSink) -> Result<()> {
        if session.settings.url_mode == UrlMode::Google {
            let urls = resolve_search_urls(
                &self.fetcher,
                &session.settings,
                &self.search_endpoint,
                |message| self.action(message),
            )
            .await?;

            let settings = &mut session.settings;
            settings.urls = urls;
            settings.url_mode = UrlMode::List;
            settings.max_depth = 0;
        }

        let filter = self.compile_filter(&session.settings);
        let crawled = self.crawl_bases(session, &filter).await;

        if crawled.is_err() && session.pages.is_empty() {
            return crawled;
        }
        if let Err(ref e) = crawled {
            warn!(
                "Crawl stopped early ({}), writing outputs for {} completed pages",
                e,
                session.pages.len()
            );
        }

        if session.settings.keyword_density || session.settings.broken_link_checker {
            self.action("Performing analysis");
            session.aggregate_keywords = aggregate_keywords(&session.pages);
        }

        self.deliver_outputs(session, sink)?;
        crawled?;

        if let Some(webhook_url) = session.settings.webhook_url.clone() {
            self.notify_webhook(session, &webhook_url).await;
        }
        Ok(())
    }

    fn compile_filter(&self, settings: &CrawlSettings) -> LinkFilter {
        match settings.url_filter.compile() {
            Ok(filter) => filter,
            Err(e) => {
                warn!("Ignoring URL filter for this run: {}", e);
                self.action(format!("Invalid URL filter ignored: {}", e));
                LinkFilter::All
            }
        }
    }

    async fn crawl_bases(&self, session: &mut CrawlSession, filter: &LinkFilter) -> Result<()> {
        let bases: Vec<String> = session
            .settings
            .urls
            .iter()
            .filter_map(|u| normalize_url(u))
            .collect();

        for base in bases {
            self.check_cancelled()?;
            info!("Processing base URL: {}", base);
            self.action(format!("Processing base URL: {}", base));

            session.processed_per_base.entry(base.clone()).or_insert(0);
            let mut frontier = Frontier::new(base.clone());
            self.seed_frontier(session, &mut frontier).await;

            let drained = self.drain(session, &mut frontier, filter).await;
            session.frontiers.insert(base, frontier);
            drained?;
        }
        Ok(())
    }

    async fn seed_frontier(&self, session: &CrawlSession, frontier: &mut Frontier) {
        let base = frontier.base_url().to_string();

        if !session.settings.crawl_sitemap {
            if !session.visited.contains(&base) {
                frontier.push(base, 0);
            }
            return;
        }

        self.action(format!("Checking for sitemap at {}", base));
        let discovery = discover_sitemap(&self.fetcher, &base).await;
        let Some(sitemap_url) = discovery.sitemap_url else {
            self.action(format!("No sitemap found for {}", base));
            return;
        };
        self.action(format!(
            "Found {} URLs in sitemap {}",
            discovery.urls.len(),
            sitemap_url
        ));

        let max_depth = session.settings.max_depth;
        for url in discovery.urls.iter().filter_map(|u| normalize_url(u)) {
            if session.visited.contains(&url) {
                continue;
            }
            match depth_from_base(&base, &url) {
                Some(depth) if depth <= max_depth => {
                    frontier.push(url, depth);
                }
                _ => debug!("Sitemap URL out of scope for {}: {}", base, url),
            }
        }
        debug!("Seeded {} URLs from sitemap for {}", frontier.len(), base);
    }

    async fn drain(
        &self,
        session: &mut CrawlSession,
        frontier: &mut Frontier,
        filter: &LinkFilter,
    ) -> Result<()> {
        let base = frontier.base_url().to_string();
        let options = session.settings.extract_options();
        let delay = Duration::from_millis(session.settings.delay_ms);
        let total = session.total_estimate();

        while !frontier.is_empty() && !session.quota_reached(&base) {
            self.check_cancelled()?;

            let Some(entry) = frontier.pop() else {
                break;
            };
            if !session.visited.insert(entry.url.clone()) {
                debug!("Already visited: {}", entry.url);
                continue;
            }

            self.action(format!("Fetching {}", entry.url));
            debug!("Fetching {} (depth {})", entry.url, entry.depth);

            match fetch_and_extract(&self.fetcher, &entry.url, &base, entry.depth, &options).await {
                Ok(outcome) => {
                    session.broken_links.extend(outcome.broken_links);
                    if session.settings.follows_links() && entry.depth < session.settings.max_depth {
                        self.enqueue_links(session, frontier, &outcome.record, filter);
                    }
                    session.record_page(outcome.record);
                    session.mark_processed(&base);
                    self.progress(session.processed, total, format!("Processed {}", entry.url));
                }
                Err(e) => {
                    warn!("Error processing {}: {}", entry.url, e);
                    if session.settings.broken_link_checker && e.is_not_found() {
                        session.broken_links.push(BrokenLinkRecord {
                            url: entry.url.clone(),
                            found_on: None,
                            status_code: Some(404),
                            error: Some(e.to_string()),
                        });
                    }
                    session.record_failure(&entry.url, &base, e.to_string());
                    session.mark_processed(&base);
                    self.progress(
                        session.processed,
                        total,
                        format!("Error processing {}: {}", entry.url, e),
                    );
                }
            }

            if !delay.is_zero() && !frontier.is_empty() && !session.quota_reached(&base) {
                self.action(format!("Rate limiting ({}ms delay)", session.settings.delay_ms));
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    fn enqueue_links(
        &self,
        session: &CrawlSession,
        frontier: &mut Frontier,
        page: &PageRecord,
        filter: &LinkFilter,
    ) {
        let Ok(page_url) = Url::parse(&page.url) else {
            return;
        };
        self.action(format!("Extracting links from {}", page.url));

        let base = frontier.base_url().to_string();
        let max_depth = session.settings.max_depth;
        let mut queued = 0;

        for link in discover_links(&page.raw_html, &page_url) {
            if session.visited.contains(&link) || frontier.contains(&link) {
                continue;
            }
            if !filter.matches(&link) {
                debug!("Filtered out: {}", link);
                continue;
            }
            match depth_from_base(&base, &link) {
                Some(depth) if depth <= max_depth => {
                    if frontier.push(link, depth) {
                        queued += 1;
                    }
                }
                _ => debug!("Out of scope for {}: {}", base, link),
            }
        }
        debug!("Queued {} new links from {}", queued, page.url);
    }

    fn deliver_outputs(&self, session: &CrawlSession, sink: &dyn DownloadSink) -> Result<()> {
        self.action("Generating outputs");
        let ctx = OutputContext::from_session(session);

        sink.deliver(&master_report(&ctx))?;

        if session.settings.csv_export {
            self.action("Generating CSV reports");
            for artifact in csv_reports(&ctx)? {
                sink.deliver(&artifact)?;
            }
        }

        if session.settings.save_individual_files {
            self.action("Saving individual files per domain");
            let files = page_files(session);
            let count = files.len();
            for (i, artifact) in files.iter().enumerate() {
                sink.deliver(artifact)?;
                self.action(format!("Saved file {} of {}", i + 1, count));
            }
        }
        Ok(())
    }

    async fn notify_webhook(&self, session: &CrawlSession, webhook_url: &str) {
        self.action("Sending webhook notification");
        let summary = WebhookSummary::from_session(session);
        match send_webhook(&self.fetcher, webhook_url, &summary).await {
            Ok(()) => self.action("Webhook notification sent successfully"),
            Err(e) => {
                warn!("Webhook notification to {} failed: {}", webhook_url, e);
                self.action("Failed to send webhook notification");
            }
        }
    }
}

/// Holds the harvester in `Running` until the run ends.
///
/// Dropping a guard without finishing it (a cancelled future) leaves the
/// harvester `Failed` so it can be reused.
pub(crate) struct RunGuard {
    state: Arc<Mutex<CrawlState>>,
    finished: bool,
}

impl RunGuard {
    fn acquire(state: Arc<Mutex<CrawlState>>) -> Result<Self> {
        {
            let mut current = state.lock().unwrap_or_else(|p| p.into_inner());
            if current.is_running() {
                return Err(CrawlError::AlreadyRunning);
            }
            *current = CrawlState::Running;
        }
        Ok(Self {
            state,
            finished: false,
        })
    }

    fn set(&mut self, next: CrawlState) {
        let mut current = self.state.lock().unwrap_or_else(|p| p.into_inner());
        *current = next;
        self.finished = true;
    }

    pub(crate) fn complete(mut self) {
        self.set(CrawlState::Completed);
    }

    pub(crate) fn fail(mut self, message: String) {
        self.set(CrawlState::Failed(message));
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.set(CrawlState::Failed("Crawl aborted".to_string()));
        }
    }
}
