use crate::analysis::KeywordCount;
use crate::frontier::Frontier;
use crate::settings::CrawlSettings;
use chrono::{DateTime, Utc};
use linkharvest_scanner::{BrokenLinkRecord, PageRecord};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

/// Lifecycle of a harvester. A new run is only accepted when not `Running`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CrawlState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed(String),
}

impl CrawlState {
    pub fn is_running(&self) -> bool {
        matches!(self, CrawlState::Running)
    }
}

/// A dequeued URL whose fetch did not produce a page.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub url: String,
    pub base_url: String,
    pub error: String,
}

/// All state for one run. Created at run start and owned by the run until it
/// is handed back to the caller.
#[derive(Debug, Clone)]
pub struct CrawlSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Effective settings; Google mode rewrites seeds and depth before crawling.
    pub settings: CrawlSettings,
    pub visited: HashSet<String>,
    /// Dequeued and attempted, successful or not.
    pub processed: usize,
    pub processed_per_base: HashMap<String, usize>,
    pub frontiers: HashMap<String, Frontier>,
    pub pages: Vec<PageRecord>,
    pub broken_links: Vec<BrokenLinkRecord>,
    pub failures: Vec<FetchFailure>,
    pub aggregate_keywords: Vec<KeywordCount>,
    /// Host → indices into `pages`, filled when per-page files are requested.
    pub pages_by_domain: BTreeMap<String, Vec<usize>>,
}

impl CrawlSession {
    pub fn new(settings: CrawlSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            settings,
            visited: HashSet::new(),
            processed: 0,
            processed_per_base: HashMap::new(),
            frontiers: HashMap::new(),
            pages: Vec::new(),
            broken_links: Vec::new(),
            failures: Vec::new(),
            aggregate_keywords: Vec::new(),
            pages_by_domain: BTreeMap::new(),
        }
    }

    pub fn processed_for(&self, base_url: &str) -> usize {
        self.processed_per_base.get(base_url).copied().unwrap_or(0)
    }

    pub fn quota_reached(&self, base_url: &str) -> bool {
        self.processed_for(base_url) >= self.settings.max_pages
    }

    /// Count an attempted fetch against the session and its base.
    pub(crate) fn mark_processed(&mut self, base_url: &str) {
        self.processed += 1;
        *self
            .processed_per_base
            .entry(base_url.to_string())
            .or_insert(0) += 1;
    }

    pub(crate) fn record_page(&mut self, record: PageRecord) {
        if self.settings.save_individual_files
            && let Some(host) = record.host()
        {
            self.pages_by_domain
                .entry(host)
                .or_default()
                .push(self.pages.len());
        }
        self.pages.push(record);
    }

    pub(crate) fn record_failure(&mut self, url: &str, base_url: &str, error: String) {
        self.failures.push(FetchFailure {
            url: url.to_string(),
            base_url: base_url.to_string(),
            error,
        });
    }

    pub fn total_estimate(&self) -> usize {
        self.settings.total_estimate()
    }

    pub fn pages_for_domain(&self, host: &str) -> Vec<&PageRecord> {
        self.pages_by_domain
            .get(host)
            .map(|indices| indices.iter().filter_map(|&i| self.pages.get(i)).collect())
            .unwrap_or_default()
    }
}
