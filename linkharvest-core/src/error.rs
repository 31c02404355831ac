use linkharvest_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("A crawl is already running")]
    AlreadyRunning,

    #[error("Invalid URL filter pattern: {0}")]
    InvalidFilter(#[from] regex::Error),

    #[error("No search results found")]
    NoSearchResults,

    #[error("Crawl cancelled")]
    Cancelled,

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
