use std::collections::{HashSet, VecDeque};

/// A URL waiting to be fetched for one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    /// Path-segment distance below the base URL.
    pub depth: usize,
    pub base_url: String,
}

/// FIFO queue of in-scope URLs for one base URL.
///
/// Dequeue order is insertion order, which makes the crawl breadth-first. A
/// URL is never queued twice while it is pending.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    base_url: String,
    queue: VecDeque<FrontierEntry>,
    pending: HashSet<String>,
}

impl Frontier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queue `url` at `depth`. Returns false when it is already pending.
    pub fn push(&mut self, url: String, depth: usize) -> bool {
        if !self.pending.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(FrontierEntry {
            url,
            depth,
            base_url: self.base_url.clone(),
        });
        true
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        let entry = self.queue.pop_front()?;
        self.pending.remove(&entry.url);
        Some(entry)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pending.contains(url)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrontierEntry> {
        self.queue.iter()
    }
}
